//! Application logging functionality
//!
//! Progress lines go to stderr; a copy of every run is written to a dated log
//! file under the user config directory when that directory is usable.

use std::fs;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "info";

/// Get the path to the fontmerge config directory
fn config_dir() -> PathBuf {
    let config_dir = dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")));
    config_dir.join("fontmerge")
}

/// Get the path to the logs directory
pub fn logs_dir() -> PathBuf {
    config_dir().join("logs")
}

/// File name of today's log
pub fn current_log_file_name() -> String {
    let timestamp = chrono::Utc::now().format("%Y-%m-%d");
    format!("fontmerge-{}.log", timestamp)
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber.
///
/// The returned guard flushes the file writer on drop; keep it alive for the
/// whole run. Calling this twice is harmless, the second call is a no-op.
pub fn init() -> Option<WorkerGuard> {
    let stderr_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    if fs::create_dir_all(logs_dir()).is_err() {
        let _ = tracing_subscriber::registry()
            .with(env_filter())
            .with(stderr_layer)
            .try_init();
        return None;
    }

    let appender = tracing_appender::rolling::never(logs_dir(), current_log_file_name());
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let file_layer = fmt::layer().with_ansi(false).with_writer(writer);

    let installed = tracing_subscriber::registry()
        .with(env_filter())
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .is_ok();

    if installed {
        tracing::info!(
            "=== fontmerge started at {} ===",
            chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
        );
        Some(guard)
    } else {
        None
    }
}

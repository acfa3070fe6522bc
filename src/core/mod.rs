//! Core application functionality
//!
//! This module contains the application shell around the pipeline:
//! - CLI handling
//! - Build configuration
//! - Error reporting and the run entry point

pub mod cli;
pub mod config_file;
pub mod platform;
pub mod runner;

// Re-export commonly used items
pub use cli::CliArgs;
pub use config_file::BuildConfig;
pub use runner::{run_app, run_pipeline};

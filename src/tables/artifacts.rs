//! Build artifact lookup and cleanup
//!
//! The composed binaries are found again by name: `<prefix>*-<style>.ttf`,
//! where the wildcard is the variant token string.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{pattern} not found in {}", dir.display())]
    NotFound { pattern: String, dir: PathBuf },
    #[error("{pattern} is not unique in {} ({count} matches)", dir.display())]
    NotUnique {
        pattern: String,
        dir: PathBuf,
        count: usize,
    },
    #[error("Cannot list {}", dir.display())]
    Unreadable {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A composed binary and the variant recovered from its name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleArtifact {
    pub path: PathBuf,
    pub variant: String,
}

/// Find the single `<prefix>*-<style>.ttf` file in `dir`.
pub fn find_artifact(dir: &Path, prefix: &str, style: &str) -> Result<StyleArtifact, ArtifactError> {
    let suffix = format!("-{style}.ttf");
    let pattern = format!("{prefix}*{suffix}");

    let entries = fs::read_dir(dir).map_err(|source| ArtifactError::Unreadable {
        dir: dir.to_path_buf(),
        source,
    })?;
    let mut matches: Vec<StyleArtifact> = entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| {
            let name = entry.file_name().into_string().ok()?;
            let variant = name
                .strip_prefix(prefix)?
                .strip_suffix(suffix.as_str())?
                .to_string();
            Some(StyleArtifact {
                path: entry.path(),
                variant,
            })
        })
        .collect();

    match matches.len() {
        0 => Err(ArtifactError::NotFound {
            pattern,
            dir: dir.to_path_buf(),
        }),
        1 => Ok(matches.remove(0)),
        count => Err(ArtifactError::NotUnique {
            pattern,
            dir: dir.to_path_buf(),
            count,
        }),
    }
}

/// Delete every file in `dir` whose name starts with `prefix`.
pub fn remove_prefixed(dir: &Path, prefix: &str) -> Result<usize> {
    let mut removed = 0;
    for entry in fs::read_dir(dir).with_context(|| format!("Cannot list {}", dir.display()))? {
        let entry = entry?;
        let is_match = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with(prefix));
        if is_match && entry.path().is_file() {
            fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
            removed += 1;
        }
    }
    debug!("Removed {removed} files starting with '{prefix}'");
    Ok(removed)
}

/// Remove intermediates, tolerating ones that are already gone.
pub fn remove_intermediates<'a>(paths: impl IntoIterator<Item = &'a Path>) {
    for path in paths {
        if let Err(err) = fs::remove_file(path) {
            if err.kind() != io::ErrorKind::NotFound {
                debug!("Could not remove {}: {err}", path.display());
            }
        }
    }
}

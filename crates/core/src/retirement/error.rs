//! Error types for the retirement module.

use std::path::PathBuf;
use thiserror::Error;

/// Problems met while retiring a source. None of them are fatal to a run.
#[derive(Debug, Error)]
pub enum RetirementError {
    /// The modification time could not be read; the source is kept.
    #[error("Cannot read modification time of {path}: {source}")]
    Age {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The source could not be deleted.
    #[error("Failed to delete {path}: {source}")]
    Delete {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The blocking task running the deletion did not finish; the source is kept.
    #[error("Retirement of {path} aborted: {reason}")]
    Aborted { path: PathBuf, reason: String },
}

impl RetirementError {
    pub fn path(&self) -> &PathBuf {
        match self {
            Self::Age { path, .. } | Self::Delete { path, .. } | Self::Aborted { path, .. } => path,
        }
    }
}

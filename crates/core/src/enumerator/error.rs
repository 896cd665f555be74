//! Error types for the enumerator module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that stop enumeration.
///
/// Problems with individual entries are logged and counted instead.
#[derive(Debug, Error)]
pub enum EnumerateError {
    /// The input root itself could not be read.
    #[error("Cannot read input directory {path}: {source}")]
    InputUnreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// The output directory resolves to the input directory.
    #[error("Output directory {path} is the input directory")]
    OutputIsInput { path: PathBuf },

    /// A mirrored directory could not be created.
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

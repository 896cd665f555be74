//! Error types for the XISF encoder.

use std::path::PathBuf;
use thiserror::Error;

use super::types::Codec;

/// Errors that can occur while writing an XISF file.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The metadata cannot be represented in the XISF header.
    ///
    /// Nothing has been written; the image can be written without metadata.
    #[error("Metadata incompatible with XISF header at keyword {keyword:?}: {reason}")]
    MetadataIncompatible { keyword: String, reason: String },

    /// Only images of shape `[height, width, channels]` can be written.
    #[error("Unsupported image geometry {shape:?}")]
    UnsupportedGeometry { shape: Vec<usize> },

    /// The sample type has no XISF equivalent.
    #[error("Unsupported sample type {sample}")]
    UnsupportedSampleFormat { sample: &'static str },

    /// The codec failed on the pixel block.
    #[error("{codec} compression failed: {source}")]
    Compression {
        codec: Codec,
        #[source]
        source: std::io::Error,
    },

    /// The XML header could not be produced.
    #[error("Failed to build XISF header: {reason}")]
    Header { reason: String },

    /// The output file could not be written.
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EncodeError {
    /// Creates a metadata incompatibility error.
    pub fn metadata_incompatible(keyword: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MetadataIncompatible {
            keyword: keyword.into(),
            reason: reason.into(),
        }
    }

    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether writing again without metadata may succeed.
    pub fn is_metadata_incompatible(&self) -> bool {
        matches!(self, Self::MetadataIncompatible { .. })
    }
}

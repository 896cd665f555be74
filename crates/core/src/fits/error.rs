//! Error types for the FITS decoder.

use std::path::PathBuf;
use thiserror::Error;

use crate::image::ShapeMismatch;

/// Errors that can occur while decoding a FITS file.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid FITS.
    #[error("Malformed FITS file {path}: {source}")]
    Format {
        path: PathBuf,
        #[source]
        source: FormatError,
    },

    /// No HDU in the file holds image data.
    #[error("No image data in {path}")]
    NoImageData { path: PathBuf },
}

/// Structural problems found while parsing FITS bytes.
#[derive(Debug, Error)]
pub enum FormatError {
    /// The first card is not `SIMPLE = T`.
    #[error("missing SIMPLE keyword")]
    NotFits,

    /// A header ran past the end of the file without an END card.
    #[error("header starting at byte {offset} has no END card")]
    MissingEnd { offset: usize },

    /// A required keyword is missing or has the wrong type.
    #[error("missing or invalid keyword {keyword}")]
    MissingKeyword { keyword: String },

    /// BITPIX is not one of 8, 16, 32, 64, -32, -64.
    #[error("unsupported BITPIX {bitpix}")]
    UnsupportedBitpix { bitpix: i64 },

    /// The data unit extends past the end of the file.
    #[error("data unit needs {needed} bytes at offset {offset}, file has {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The axis lengths describe a data unit too large to address.
    #[error("data unit of {axes:?} samples of {bitpix} bits does not fit in memory")]
    Oversized { bitpix: i64, axes: Vec<usize> },

    /// Axis lengths do not describe the data unit.
    #[error(transparent)]
    Shape(#[from] ShapeMismatch),
}

impl DecodeError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Attaches a path to a format error.
    pub fn format(path: impl Into<PathBuf>, source: FormatError) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }
}

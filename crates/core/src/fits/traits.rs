//! Trait definitions for the FITS module.

use std::path::Path;

use super::error::DecodeError;
use super::types::Header;
use crate::image::Image;

/// A decoder for the source image format.
pub trait SourceDecoder: Send + Sync {
    /// Returns the name of this decoder implementation.
    fn name(&self) -> &str;

    /// Reads pixel data and header from a file.
    ///
    /// The header is the file's primary header; the pixel data comes from the
    /// first HDU that carries any.
    fn read(&self, path: &Path) -> Result<(Image, Header), DecodeError>;
}

//! Trait definitions for the XISF module.

use std::path::Path;

use super::error::EncodeError;
use super::types::{CodecConfig, WriteReport};
use crate::image::Image;
use crate::metadata::MetadataRecord;

/// An encoder for the target image format.
pub trait TargetEncoder: Send + Sync {
    /// Returns the name of this encoder implementation.
    fn name(&self) -> &str;

    /// Writes `image` to `path`, attaching `metadata` when given.
    ///
    /// Fails with [`EncodeError::MetadataIncompatible`] before touching the
    /// filesystem when the metadata cannot be represented; every other
    /// failure uses a different variant.
    fn write(
        &self,
        path: &Path,
        image: &Image,
        metadata: Option<&MetadataRecord>,
        codec: &CodecConfig,
    ) -> Result<WriteReport, EncodeError>;
}

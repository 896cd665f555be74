//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::types::{ConversionOutcome, ConversionTask};
use crate::xisf::CodecConfig;

/// Converts one source file into one target file.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Runs one conversion.
    ///
    /// Never fails and never panics: every problem is carried in the
    /// returned outcome.
    async fn convert(&self, task: ConversionTask, codec: &CodecConfig) -> ConversionOutcome;
}

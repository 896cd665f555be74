//! Types for the converter module.

use serde::Serialize;
use std::path::PathBuf;

use super::error::ConversionError;
use crate::xisf::Codec;

/// One source file to convert and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionTask {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl ConversionTask {
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
        }
    }
}

/// What happened to the source header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MetadataDisposition {
    /// Written as FITS keywords.
    Attached { keywords: usize },
    /// Rejected by the encoder; the image was written without it.
    Dropped { reason: String },
}

impl MetadataDisposition {
    pub fn is_attached(&self) -> bool {
        matches!(self, Self::Attached { .. })
    }
}

/// A successful conversion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Converted {
    pub bytes_written: u64,
    pub codec_used: Codec,
    pub metadata: MetadataDisposition,
}

/// The single result of processing a `ConversionTask`.
#[derive(Debug)]
pub struct ConversionOutcome {
    pub task: ConversionTask,
    pub result: Result<Converted, ConversionError>,
}

impl ConversionOutcome {
    pub fn converted(task: ConversionTask, converted: Converted) -> Self {
        Self {
            task,
            result: Ok(converted),
        }
    }

    pub fn failed(task: ConversionTask, error: impl Into<ConversionError>) -> Self {
        Self {
            task,
            result: Err(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Whether the source may be handed to the retirement policy.
    ///
    /// Sources of fallback writes are the only remaining copy of their
    /// header and qualify only when `retire_fallbacks` is set.
    pub fn retirement_eligible(&self, retire_fallbacks: bool) -> bool {
        match &self.result {
            Ok(converted) => retire_fallbacks || converted.metadata.is_attached(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::xisf::EncodeError;

    fn converted(metadata: MetadataDisposition) -> Converted {
        Converted {
            bytes_written: 8192,
            codec_used: Codec::Zlib,
            metadata,
        }
    }

    #[test]
    fn test_retirement_eligibility() {
        let task = ConversionTask::new("/in/a.fits", "/out/a.xisf");

        let attached = ConversionOutcome::converted(
            task.clone(),
            converted(MetadataDisposition::Attached { keywords: 12 }),
        );
        assert!(attached.retirement_eligible(false));
        assert!(attached.retirement_eligible(true));

        let dropped = ConversionOutcome::converted(
            task.clone(),
            converted(MetadataDisposition::Dropped {
                reason: "bad keyword".into(),
            }),
        );
        assert!(dropped.is_success());
        assert!(!dropped.retirement_eligible(false));
        assert!(dropped.retirement_eligible(true));

        let failed = ConversionOutcome::failed(task, EncodeError::Header { reason: "x".into() });
        assert!(!failed.is_success());
        assert!(!failed.retirement_eligible(true));
    }

    #[test]
    fn test_converted_serialization() {
        let json = serde_json::to_value(converted(MetadataDisposition::Attached { keywords: 3 })).unwrap();
        assert_eq!(json["codec_used"], "zlib");
        assert_eq!(json["metadata"]["status"], "attached");
        assert_eq!(json["metadata"]["keywords"], 3);
    }
}

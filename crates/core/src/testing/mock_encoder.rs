//! Mock encoder for testing.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::image::Image;
use crate::metadata::MetadataRecord;
use crate::xisf::{CodecConfig, EncodeError, TargetEncoder, WriteReport};

/// A recorded write for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedWrite {
    pub path: PathBuf,
    pub shape: Vec<usize>,
    /// Whether a metadata record was passed.
    pub with_metadata: bool,
}

#[derive(Debug, Clone, Copy, Default)]
enum Behavior {
    #[default]
    Succeed,
    RejectMetadata,
    FailIo,
}

/// Mock implementation of the TargetEncoder trait.
///
/// Records every write and, on success, writes a few placeholder bytes to
/// the target path.
#[derive(Debug, Clone, Default)]
pub struct MockEncoder {
    writes: Arc<Mutex<Vec<RecordedWrite>>>,
    behavior: Behavior,
}

impl MockEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects every write that carries metadata.
    pub fn rejecting_metadata() -> Self {
        Self {
            behavior: Behavior::RejectMetadata,
            ..Self::default()
        }
    }

    /// Fails every write with an I/O error.
    pub fn failing_io() -> Self {
        Self {
            behavior: Behavior::FailIo,
            ..Self::default()
        }
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TargetEncoder for MockEncoder {
    fn name(&self) -> &str {
        "mock"
    }

    fn write(
        &self,
        path: &Path,
        image: &Image,
        metadata: Option<&MetadataRecord>,
        codec: &CodecConfig,
    ) -> Result<WriteReport, EncodeError> {
        self.writes
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedWrite {
                path: path.to_path_buf(),
                shape: image.shape().to_vec(),
                with_metadata: metadata.is_some(),
            });

        match self.behavior {
            Behavior::RejectMetadata if metadata.is_some() => {
                return Err(EncodeError::metadata_incompatible("MOCK", "rejected by mock"))
            }
            Behavior::FailIo => {
                let source = std::io::Error::new(std::io::ErrorKind::StorageFull, "mock disk full");
                return Err(EncodeError::io(path, source));
            }
            _ => {}
        }

        std::fs::write(path, b"XISF0100").map_err(|e| EncodeError::io(path, e))?;
        Ok(WriteReport {
            bytes_written: 8,
            codec_used: codec.codec,
            shuffled: false,
        })
    }
}

//! Error types for the converter module.

use thiserror::Error;

use crate::fits::DecodeError;
use crate::xisf::EncodeError;

/// Reasons a single conversion failed.
#[derive(Debug, Error)]
pub enum ConversionError {
    /// The source could not be read.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// The target could not be written, with or without metadata.
    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// The blocking conversion panicked or was cancelled.
    #[error("Conversion worker aborted: {reason}")]
    WorkerAborted { reason: String },
}

impl ConversionError {
    /// Short category name for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::Encode(_) => "encode",
            Self::WorkerAborted { .. } => "worker",
        }
    }

    pub(crate) fn from_join(error: tokio::task::JoinError) -> Self {
        let reason = if error.is_panic() {
            let payload = error.into_panic();
            payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panic with non-string payload".to_string())
        } else {
            "task cancelled".to_string()
        };
        Self::WorkerAborted { reason }
    }
}

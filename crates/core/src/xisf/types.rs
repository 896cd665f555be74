//! Types for the XISF module.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Compression codec for the pixel block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Codec {
    /// Uncompressed.
    None,
    Zlib,
    Lz4,
    Zstd,
}

impl Codec {
    /// Codec name used in the XISF `compression` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Zlib => "zlib",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Accepted compression levels, or `None` when the level is ignored.
    pub fn level_range(&self) -> Option<RangeInclusive<i32>> {
        match self {
            Self::Zlib => Some(0..=9),
            Self::Zstd => Some(1..=22),
            Self::None | Self::Lz4 => None,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder settings for a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecConfig {
    pub codec: Codec,
    /// Byte-shuffle samples before compressing.
    pub shuffle: bool,
    pub level: i32,
    /// Recorded as `XISF:CreatorApplication`.
    pub creator_app: String,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            codec: Codec::Zlib,
            shuffle: true,
            level: 6,
            creator_app: "fitsbatch".to_string(),
        }
    }
}

/// XISF sample formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    UInt8,
    UInt16,
    UInt32,
    Float32,
    Float64,
}

impl SampleFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
        }
    }

    pub fn item_size(&self) -> usize {
        match self {
            Self::UInt8 => 1,
            Self::UInt16 => 2,
            Self::UInt32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    /// Size of the file on disk.
    pub bytes_written: u64,
    /// Codec applied to the pixel block; `None` when compression did not pay off.
    pub codec_used: Codec,
    /// Whether the block was byte-shuffled.
    pub shuffled: bool,
}

//! XISF encoding.
//!
//! This module provides the `TargetEncoder` trait and `XisfEncoder`, which
//! writes monolithic XISF 1.0 files: a signature, an XML header and one
//! attached, optionally compressed, pixel block.
//!
//! # Features
//!
//! - `zlib`, `lz4` and `zstd` compression, with byte shuffling
//! - Planar pixel storage for `Gray` and `RGB` images
//! - FITS keywords carried as `FITSKeyword` elements
//! - Typed rejection of metadata the header cannot represent, so callers
//!   can retry without it
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::xisf::{Codec, CodecConfig, TargetEncoder, XisfEncoder};
//!
//! let codec = CodecConfig { codec: Codec::Zstd, shuffle: true, level: 9, creator_app: "fitsbatch".into() };
//! let report = XisfEncoder::new().write(Path::new("/out/m31.xisf"), &image, Some(&record), &codec)?;
//! println!("{} bytes, codec={}", report.bytes_written, report.codec_used);
//! ```

mod compression;
mod encoder;
mod error;
mod header;
mod traits;
mod types;

pub use encoder::XisfEncoder;
pub use error::EncodeError;
pub use traits::TargetEncoder;
pub use types::{Codec, CodecConfig, SampleFormat, WriteReport};

pub(crate) use compression::{decompress, unshuffle};

/// File extension of converted images.
pub const XISF_EXTENSION: &str = "xisf";

/// Monolithic XISF 1.0 file signature.
pub const SIGNATURE: &[u8; 8] = b"XISF0100";

//! Conversion worker.
//!
//! This module provides the `Converter` trait and `XisfConverter`, which
//! turns one FITS file into one XISF file: decode, normalize the image to
//! three axes, attach the header as metadata and write. When the encoder
//! rejects the metadata the image is written a second time without it.
//!
//! Every call produces a `ConversionOutcome`. Decode and encode failures,
//! and panics inside the blocking conversion, are reported in the outcome
//! rather than returned as errors.
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::converter::{ConversionTask, Converter, XisfConverter};
//!
//! let converter = XisfConverter::new();
//! let task = ConversionTask::new("/raw/m31.fits", "/xisf/m31.xisf");
//! let outcome = converter.convert(task, &codec).await;
//! if let Ok(converted) = &outcome.result {
//!     println!("{} bytes, codec={}", converted.bytes_written, converted.codec_used);
//! }
//! ```

mod error;
mod traits;
mod types;
mod worker;

pub use error::ConversionError;
pub use traits::Converter;
pub use types::{ConversionOutcome, ConversionTask, Converted, MetadataDisposition};
pub use worker::{convert_file, XisfConverter};

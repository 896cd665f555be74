//! FITS decoding.
//!
//! This module provides the `SourceDecoder` trait and `FitsDecoder`, which
//! reads the primary header and the first HDU carrying image data.
//!
//! # Features
//!
//! - Primary arrays and `IMAGE` extensions (other extensions are skipped)
//! - All standard BITPIX values
//! - Unsigned integer detection from `BZERO`, float promotion for other scaling
//! - `HIERARCH` keywords and `CONTINUE` long strings
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::fits::{FitsDecoder, SourceDecoder};
//!
//! let (image, header) = FitsDecoder::new().read(Path::new("/nights/m31_L_001.fits"))?;
//! println!("{:?} {:?}", image.shape(), header.get("EXPTIME"));
//! ```

mod card;
mod decoder;
mod error;
mod traits;
mod types;

pub use decoder::FitsDecoder;
pub use error::{DecodeError, FormatError};
pub use traits::SourceDecoder;
pub use types::{Header, HeaderCard, HeaderValue};

/// File extension of convertible sources, matched case-insensitively.
pub const FITS_EXTENSION: &str = "fits";

/// FITS files are organised in blocks of this many bytes.
pub const BLOCK_SIZE: usize = 2880;

/// Length of one header card.
pub const CARD_SIZE: usize = 80;

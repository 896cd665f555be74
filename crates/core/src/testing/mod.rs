//! Testing utilities and mock implementations.
//!
//! This module provides mock implementations of the converter and encoder
//! traits, plus fixtures to write small FITS files and read back XISF
//! output, so the whole pipeline can be exercised inside a temp directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use fitsbatch_core::testing::fixtures::{inspect_xisf, FitsFixture};
//!
//! FitsFixture::u16_image(64, 48, &pixels)
//!     .card("EXPTIME", "300.0", Some("[s]"))
//!     .write(&input.join("m31.fits"))?;
//!
//! // ... run a batch ...
//!
//! let xisf = inspect_xisf(&output.join("m31.xisf"))?;
//! assert_eq!(xisf.geometry, "64:48:1");
//! ```

mod mock_converter;
mod mock_encoder;

pub mod fixtures;

pub use mock_converter::{MockConverter, MOCK_OUTPUT};
pub use mock_encoder::{MockEncoder, RecordedWrite};

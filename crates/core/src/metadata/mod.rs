//! Header normalization.
//!
//! Turns a FITS header into the string-only keyword record attached to
//! XISF images as `FITSKeyword` elements.

mod normalizer;
mod types;

pub use normalizer::normalize;
pub use types::{KeywordEntry, MetadataRecord};

//! Tree enumeration.
//!
//! Walks the input tree once, mirroring every directory under the output
//! root. FITS files become conversion tasks; everything else is copied
//! across immediately with its permissions and timestamps.
//!
//! # Features
//!
//! - Name-sorted, deterministic walk; symlinks are not followed
//! - `.fits` matched case-insensitively, mapped 1:1 to `.xisf`
//! - Existing outputs skipped when `skip_existing` is set
//! - An output root nested inside the input root is never walked
//! - Copy failures and unreadable entries are counted, not fatal
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::enumerator::{enumerate, EnumerationOptions};
//!
//! let enumeration = enumerate(&EnumerationOptions::from_config(&config))?;
//! println!("{} to convert, {} skipped", enumeration.tasks.len(), enumeration.stats.skipped);
//! ```

mod copy;
mod error;
mod types;
mod walker;

pub use copy::copy_preserving;
pub use error::EnumerateError;
pub use types::{Enumeration, EnumerationOptions, EnumerationStats};
pub use walker::{destination_for, enumerate, is_convertible, relative_display};

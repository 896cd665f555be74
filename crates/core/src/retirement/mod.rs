//! Source retirement.
//!
//! After a source has been converted successfully it may be deleted,
//! depending on its age. The age is taken from the file's modification time
//! at the moment of the decision.
//!
//! | `delete_older_than_days` | Policy                              |
//! |--------------------------|-------------------------------------|
//! | `-1`                     | never delete                        |
//! | `0`                      | delete right after conversion       |
//! | `N > 0`                  | delete once the file is N days old  |
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::retirement::{maybe_delete, RetirementDecision, RetirementPolicy};
//!
//! let policy = RetirementPolicy::from_days(30).unwrap();
//! match maybe_delete(Path::new("/raw/m31.fits"), policy)? {
//!     RetirementDecision::Deleted => println!("deleted"),
//!     RetirementDecision::TooRecent { age_days, .. } => println!("kept, {age_days:.1} days old"),
//!     RetirementDecision::Disabled => {}
//! }
//! ```

mod error;
mod policy;
mod types;

pub use error::RetirementError;
pub use policy::{maybe_delete, maybe_delete_at};
pub use types::{RetirementDecision, RetirementPolicy};

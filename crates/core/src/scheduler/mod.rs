//! Parallel scheduling of conversions.
//!
//! `BatchScheduler` runs conversion tasks on at most `workers` concurrent
//! workers, handles outcomes in completion order and applies the retirement
//! policy to every successfully converted source.
//!
//! # Example
//!
//! ```ignore
//! use fitsbatch_core::converter::XisfConverter;
//! use fitsbatch_core::scheduler::{BatchScheduler, SchedulerConfig};
//!
//! let config = SchedulerConfig::new(8, codec).with_retirement(RetirementPolicy::OlderThan { days: 30 }, false);
//! let report = BatchScheduler::new(XisfConverter::new(), config).run(tasks).await;
//! println!("{} converted, {} failed", report.summary.converted, report.summary.failed);
//! ```

mod config;
mod runner;
mod types;

pub use config::SchedulerConfig;
pub use runner::BatchScheduler;
pub use types::{RetirementRecord, RunReport, RunSummary};

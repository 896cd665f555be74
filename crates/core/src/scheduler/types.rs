//! Types for the scheduler module.

use serde::Serialize;
use std::path::PathBuf;

use crate::converter::ConversionOutcome;
use crate::retirement::{RetirementDecision, RetirementError};

/// Counters for a finished run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub submitted: usize,
    /// Successful conversions, fallbacks included.
    pub converted: usize,
    /// Conversions written without their metadata.
    pub converted_without_metadata: usize,
    pub failed: usize,
    /// Sources deleted after conversion.
    pub retired: usize,
    /// Sources kept because they were too recent.
    pub retained: usize,
    pub retirement_errors: usize,
    pub bytes_written: u64,
}

impl RunSummary {
    /// Every submitted task produced an outcome.
    pub fn is_complete(&self) -> bool {
        self.converted + self.failed == self.submitted
    }
}

/// Retirement result for one converted source.
#[derive(Debug)]
pub struct RetirementRecord {
    pub source: PathBuf,
    pub result: Result<RetirementDecision, RetirementError>,
}

/// Everything a run produced, outcomes in completion order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub summary: RunSummary,
    pub outcomes: Vec<ConversionOutcome>,
    pub retirements: Vec<RetirementRecord>,
}

//! Types for the enumerator module.

use serde::Serialize;
use std::path::PathBuf;

use crate::config::Config;
use crate::converter::ConversionTask;

/// What to walk and where to mirror it.
#[derive(Debug, Clone)]
pub struct EnumerationOptions {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Do not enqueue sources whose output already exists.
    pub skip_existing: bool,
}

impl EnumerationOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            input_dir: config.paths.input_dir.clone(),
            output_dir: config.paths.output_dir.clone(),
            skip_existing: config.run.skip_existing,
        }
    }
}

/// Counters gathered during the walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnumerationStats {
    /// Directories mirrored, the root included.
    pub directories: usize,
    /// Sources not enqueued because their output exists.
    pub skipped: usize,
    /// Files passed through unchanged.
    pub copied: usize,
    pub bytes_copied: u64,
    pub copy_failures: usize,
    /// Files left alone because an earlier entry already maps to their output.
    pub collisions: usize,
    /// Entries that could not be read.
    pub unreadable: usize,
}

/// Result of walking the input tree.
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    /// Conversion tasks in walk order.
    pub tasks: Vec<ConversionTask>,
    pub stats: EnumerationStats,
}

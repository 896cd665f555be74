//! Scheduler configuration.

use std::path::PathBuf;

use crate::config::Config;
use crate::retirement::RetirementPolicy;
use crate::xisf::CodecConfig;

/// Settings for one scheduler run.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Maximum conversions in flight.
    pub workers: usize,
    pub codec: CodecConfig,
    pub retirement: RetirementPolicy,
    /// Also retire sources written without their metadata.
    pub retire_metadata_fallbacks: bool,
    /// Roots used to shorten paths in log lines.
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl SchedulerConfig {
    pub fn new(workers: usize, codec: CodecConfig) -> Self {
        Self {
            workers,
            codec,
            retirement: RetirementPolicy::Disabled,
            retire_metadata_fallbacks: false,
            input_dir: PathBuf::new(),
            output_dir: PathBuf::new(),
        }
    }

    pub fn with_retirement(mut self, policy: RetirementPolicy, retire_metadata_fallbacks: bool) -> Self {
        self.retirement = policy;
        self.retire_metadata_fallbacks = retire_metadata_fallbacks;
        self
    }

    pub fn with_roots(mut self, input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        self.input_dir = input_dir.into();
        self.output_dir = output_dir.into();
        self
    }

    /// Builds the settings from a configuration, with `policy` already
    /// derived and checked by the caller.
    pub fn from_config(config: &Config, policy: RetirementPolicy) -> Self {
        Self::new(config.run.workers, config.codec_config())
            .with_retirement(policy, config.retirement.retire_metadata_fallbacks)
            .with_roots(&config.paths.input_dir, &config.paths.output_dir)
    }
}

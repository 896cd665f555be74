use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::retirement::RetirementPolicy;
use crate::xisf::{Codec, CodecConfig};

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub paths: PathsConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub run: RunConfig,
    #[serde(default)]
    pub retirement: RetirementConfig,
}

impl Config {
    /// Builds the encoder settings shared by every conversion of the run.
    pub fn codec_config(&self) -> CodecConfig {
        CodecConfig {
            codec: self.output.codec,
            shuffle: self.output.shuffle,
            level: self.output.level,
            creator_app: self.output.creator_app.clone(),
        }
    }

    /// Returns the retirement policy, or `None` if the configured threshold is invalid.
    pub fn retirement_policy(&self) -> Option<RetirementPolicy> {
        RetirementPolicy::from_days(self.retirement.delete_older_than_days)
    }
}

/// Source and destination trees
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PathsConfig {
    /// Root of the tree to convert.
    pub input_dir: PathBuf,
    /// Root of the mirrored output tree.
    pub output_dir: PathBuf,
}

/// XISF output settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_codec")]
    pub codec: Codec,
    #[serde(default = "default_true")]
    pub shuffle: bool,
    #[serde(default = "default_level")]
    pub level: i32,
    #[serde(default = "default_creator_app")]
    pub creator_app: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            codec: default_codec(),
            shuffle: true,
            level: default_level(),
            creator_app: default_creator_app(),
        }
    }
}

fn default_codec() -> Codec {
    Codec::Zlib
}

fn default_level() -> i32 {
    6
}

fn default_creator_app() -> String {
    "fitsbatch".to_string()
}

fn default_true() -> bool {
    true
}

/// Batch execution settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RunConfig {
    /// Number of concurrent conversion workers.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Skip sources whose `.xisf` destination already exists.
    #[serde(default = "default_true")]
    pub skip_existing: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            skip_existing: true,
        }
    }
}

fn default_workers() -> usize {
    4
}

/// Source retirement settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetirementConfig {
    /// -1 never deletes, 0 deletes right after conversion, N deletes sources at least N days old.
    #[serde(default = "default_delete_older_than_days")]
    pub delete_older_than_days: i64,
    /// Also retire sources whose header could not be carried into the XISF file.
    #[serde(default)]
    pub retire_metadata_fallbacks: bool,
}

impl Default for RetirementConfig {
    fn default() -> Self {
        Self {
            delete_older_than_days: default_delete_older_than_days(),
            retire_metadata_fallbacks: false,
        }
    }
}

fn default_delete_older_than_days() -> i64 {
    -1
}

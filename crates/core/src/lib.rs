pub mod batch;
pub mod config;
pub mod converter;
pub mod enumerator;
pub mod fits;
pub mod image;
pub mod metadata;
pub mod retirement;
pub mod scheduler;
pub mod testing;
pub mod xisf;

pub use batch::{run_batch, run_batch_with, BatchError, BatchReport};
pub use config::{load_config, load_config_from_str, validate_config, Config, ConfigError};
pub use converter::{ConversionOutcome, ConversionTask, Converter, XisfConverter};
pub use scheduler::{BatchScheduler, RunSummary, SchedulerConfig};

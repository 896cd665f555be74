//! End-to-end batch run: validate, enumerate, convert, retire.

use thiserror::Error;
use tracing::info;

use crate::config::{validate_config, Config, ConfigError};
use crate::converter::{Converter, XisfConverter};
use crate::enumerator::{enumerate, EnumerateError, EnumerationOptions, EnumerationStats};
use crate::scheduler::{BatchScheduler, RunReport, RunSummary, SchedulerConfig};

/// Errors that abort a batch before any conversion starts.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Enumerate(#[from] EnumerateError),
}

/// Result of a complete batch run.
#[derive(Debug)]
pub struct BatchReport {
    pub enumeration: EnumerationStats,
    pub run: RunReport,
}

impl BatchReport {
    pub fn summary(&self) -> &RunSummary {
        &self.run.summary
    }
}

/// Converts the configured tree with the FITS to XISF converter.
pub async fn run_batch(config: &Config) -> Result<BatchReport, BatchError> {
    run_batch_with(config, XisfConverter::new()).await
}

/// Converts the configured tree with the given converter.
///
/// The configuration is validated first. Enumeration, including every
/// pass-through copy, completes before the first conversion is dispatched.
pub async fn run_batch_with<C>(config: &Config, converter: C) -> Result<BatchReport, BatchError>
where
    C: Converter + 'static,
{
    validate_config(config)?;
    let policy = config.retirement_policy().ok_or_else(|| {
        ConfigError::ValidationError("invalid retirement threshold".to_string())
    })?;

    info!(
        input = %config.paths.input_dir.display(),
        output = %config.paths.output_dir.display(),
        codec = %config.output.codec,
        retirement = %policy,
        "Starting batch"
    );

    let enumeration = enumerate(&EnumerationOptions::from_config(config))?;
    let scheduler = BatchScheduler::new(converter, SchedulerConfig::from_config(config, policy));
    let run = scheduler.run(enumeration.tasks).await;

    Ok(BatchReport {
        enumeration: enumeration.stats,
        run,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;
    use crate::testing::MockConverter;
    use tempfile::TempDir;

    fn config(input: &std::path::Path, output: &std::path::Path, extra: &str) -> Config {
        load_config_from_str(&format!(
            "[paths]\ninput_dir = {:?}\noutput_dir = {:?}\n{extra}",
            input.display().to_string(),
            output.display().to_string()
        ))
        .unwrap()
    }

    #[tokio::test]
    async fn test_invalid_config_stops_before_output() {
        let root = TempDir::new().unwrap();
        let output = root.path().join("out");
        let config = config(&root.path().join("missing"), &output, "");

        let err = run_batch_with(&config, MockConverter::new()).await.unwrap_err();
        assert!(matches!(err, BatchError::Config(ConfigError::ValidationError(_))));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn test_batch_runs_every_enumerated_task() {
        let root = TempDir::new().unwrap();
        let input = root.path().join("raw");
        let output = root.path().join("xisf");
        std::fs::create_dir_all(input.join("n1")).unwrap();
        std::fs::write(input.join("n1/a.fits"), b"SIMPLE").unwrap();
        std::fs::write(input.join("n1/b.fits"), b"SIMPLE").unwrap();
        std::fs::write(input.join("log.txt"), b"ok").unwrap();
        let converter = MockConverter::new();

        let report = run_batch_with(&config(&input, &output, ""), converter.clone())
            .await
            .unwrap();

        assert_eq!(report.summary().converted, 2);
        assert_eq!(report.enumeration.copied, 1);
        assert_eq!(converter.conversion_count().await, 2);
        assert!(output.join("n1/a.xisf").exists());
    }
}

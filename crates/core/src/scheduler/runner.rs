//! Bounded worker pool.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use super::config::SchedulerConfig;
use super::types::{RetirementRecord, RunReport};
use crate::converter::{ConversionError, ConversionOutcome, ConversionTask, Converter};
use crate::enumerator::relative_display;
use crate::retirement::{maybe_delete, RetirementDecision, RetirementError, RetirementPolicy};

/// Runs conversion tasks with bounded concurrency.
pub struct BatchScheduler<C: Converter> {
    converter: Arc<C>,
    config: SchedulerConfig,
}

impl<C: Converter + 'static> BatchScheduler<C> {
    pub fn new(converter: C, config: SchedulerConfig) -> Self {
        Self::with_shared(Arc::new(converter), config)
    }

    /// Creates a scheduler around a converter the caller keeps a handle to.
    pub fn with_shared(converter: Arc<C>, config: SchedulerConfig) -> Self {
        Self { converter, config }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Converts every task and returns once each has produced its outcome.
    pub async fn run(&self, tasks: Vec<ConversionTask>) -> RunReport {
        let workers = self.config.workers.max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut join_set = JoinSet::new();
        let mut report = RunReport::default();
        report.summary.submitted = tasks.len();

        info!(
            tasks = tasks.len(),
            workers,
            converter = self.converter.name(),
            "Converting FITS files"
        );

        for task in tasks {
            let semaphore = Arc::clone(&semaphore);
            let converter = Arc::clone(&self.converter);
            let codec = self.config.codec.clone();

            join_set.spawn(async move {
                let _permit = match semaphore.acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => {
                        let reason = "worker pool closed".to_string();
                        return ConversionOutcome::failed(task, ConversionError::WorkerAborted { reason });
                    }
                };
                // Run the conversion as its own task so a panic still
                // leaves us holding the task it belonged to.
                let job = task.clone();
                let conversion = tokio::spawn(async move { converter.convert(job, &codec).await });
                match conversion.await {
                    Ok(outcome) => outcome,
                    Err(e) => ConversionOutcome::failed(task, ConversionError::from_join(e)),
                }
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(outcome) => self.settle(outcome, &mut report).await,
                Err(e) => {
                    error!(error = %e, "Worker task lost");
                    report.summary.failed += 1;
                }
            }
        }

        let summary = &report.summary;
        info!(
            converted = summary.converted,
            without_metadata = summary.converted_without_metadata,
            failed = summary.failed,
            retired = summary.retired,
            retained = summary.retained,
            retirement_errors = summary.retirement_errors,
            bytes_written = summary.bytes_written,
            "Conversion run complete"
        );
        report
    }

    /// Reports one outcome and retires its source when eligible.
    async fn settle(&self, outcome: ConversionOutcome, report: &mut RunReport) {
        let source = relative_display(&outcome.task.source, &self.config.input_dir);

        match &outcome.result {
            Ok(converted) => {
                info!(
                    source = %source,
                    destination = %relative_display(&outcome.task.destination, &self.config.output_dir),
                    bytes = converted.bytes_written,
                    codec = %converted.codec_used,
                    "Converted"
                );
                report.summary.converted += 1;
                report.summary.bytes_written += converted.bytes_written;
                if !converted.metadata.is_attached() {
                    report.summary.converted_without_metadata += 1;
                }

                if self.config.retirement.is_enabled() {
                    if outcome.retirement_eligible(self.config.retire_metadata_fallbacks) {
                        let result = retire(outcome.task.source.clone(), self.config.retirement).await;
                        self.record_retirement(&source, &result, report);
                        report.retirements.push(RetirementRecord {
                            source: outcome.task.source.clone(),
                            result,
                        });
                    } else {
                        info!(source = %source, "Keeping original, metadata was not carried over");
                    }
                }
            }
            Err(e) => {
                error!(source = %source, kind = e.kind(), error = %e, "Conversion failed");
                report.summary.failed += 1;
            }
        }

        report.outcomes.push(outcome);
    }

    fn record_retirement(
        &self,
        source: &str,
        result: &Result<RetirementDecision, RetirementError>,
        report: &mut RunReport,
    ) {
        match result {
            Ok(RetirementDecision::Deleted) => {
                info!(source = %source, "Deleted original");
                report.summary.retired += 1;
            }
            Ok(RetirementDecision::TooRecent {
                age_days,
                threshold_days,
            }) => {
                info!(
                    source = %source,
                    age_days = *age_days,
                    threshold_days,
                    "Skipped deletion, file too recent"
                );
                report.summary.retained += 1;
            }
            Ok(RetirementDecision::Disabled) => {}
            Err(e) => {
                warn!(source = %source, error = %e, "Could not retire original");
                report.summary.retirement_errors += 1;
            }
        }
    }
}

/// Applies the retirement policy off the async runtime.
async fn retire(source: PathBuf, policy: RetirementPolicy) -> Result<RetirementDecision, RetirementError> {
    let path = source.clone();
    tokio::task::spawn_blocking(move || maybe_delete(&source, policy))
        .await
        .unwrap_or_else(|e| {
            Err(RetirementError::Aborted {
                path,
                reason: e.to_string(),
            })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockConverter;
    use crate::xisf::CodecConfig;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn sources(dir: &TempDir, count: usize) -> Vec<ConversionTask> {
        (0..count)
            .map(|i| {
                let source = dir.path().join(format!("light_{i:03}.fits"));
                fs::write(&source, b"SIMPLE").unwrap();
                ConversionTask::new(source, dir.path().join(format!("light_{i:03}.xisf")))
            })
            .collect()
    }

    fn config(workers: usize) -> SchedulerConfig {
        SchedulerConfig::new(workers, CodecConfig::default())
    }

    #[tokio::test]
    async fn test_every_task_produces_one_outcome() {
        let dir = TempDir::new().unwrap();
        let tasks = sources(&dir, 10);
        let converter = MockConverter::new();
        converter.fail_on(&tasks[3].source).await;
        converter.fail_on(&tasks[7].source).await;

        let scheduler = BatchScheduler::with_shared(Arc::new(converter.clone()), config(4));
        let report = scheduler.run(tasks.clone()).await;

        assert_eq!(report.outcomes.len(), 10);
        assert_eq!(report.summary.converted, 8);
        assert_eq!(report.summary.failed, 2);
        assert!(report.summary.is_complete());
        assert_eq!(converter.conversion_count().await, 10);

        let mut seen: Vec<_> = report.outcomes.iter().map(|o| o.task.source.clone()).collect();
        seen.sort();
        assert_eq!(seen, tasks.iter().map(|t| t.source.clone()).collect::<Vec<_>>());
        assert!(!tasks[3].destination.exists());
        assert!(tasks[4].destination.exists());
    }

    #[tokio::test]
    async fn test_concurrency_bounded_by_workers() {
        let dir = TempDir::new().unwrap();
        let converter = MockConverter::new().with_delay(Duration::from_millis(40));

        let scheduler = BatchScheduler::with_shared(Arc::new(converter.clone()), config(3));
        let report = scheduler.run(sources(&dir, 12)).await;

        assert_eq!(report.summary.converted, 12);
        assert_eq!(converter.max_concurrency(), 3);
    }

    #[tokio::test]
    async fn test_only_successful_sources_retired() {
        let dir = TempDir::new().unwrap();
        let tasks = sources(&dir, 3);
        let converter = MockConverter::new();
        converter.fail_on(&tasks[0].source).await;
        converter.drop_metadata_on(&tasks[1].source).await;

        let config = config(2).with_retirement(RetirementPolicy::Immediate, false);
        let report = BatchScheduler::new(converter, config).run(tasks.clone()).await;

        assert!(tasks[0].source.exists(), "failed conversion keeps source");
        assert!(tasks[1].source.exists(), "fallback keeps source");
        assert!(!tasks[2].source.exists());
        assert_eq!(report.summary.retired, 1);
        assert_eq!(report.summary.converted_without_metadata, 1);
        assert_eq!(report.retirements.len(), 1);
        assert_eq!(report.retirements[0].source, tasks[2].source);
    }

    #[tokio::test]
    async fn test_fallbacks_retired_when_enabled() {
        let dir = TempDir::new().unwrap();
        let tasks = sources(&dir, 1);
        let converter = MockConverter::new();
        converter.drop_metadata_on(&tasks[0].source).await;

        let config = config(1).with_retirement(RetirementPolicy::Immediate, true);
        let report = BatchScheduler::new(converter, config).run(tasks.clone()).await;

        assert!(!tasks[0].source.exists());
        assert_eq!(report.summary.retired, 1);
    }

    #[tokio::test]
    async fn test_retirement_errors_are_counted() {
        let dir = TempDir::new().unwrap();
        let tasks = vec![ConversionTask::new(
            dir.path().join("vanished.fits"),
            dir.path().join("vanished.xisf"),
        )];

        let config = config(1).with_retirement(RetirementPolicy::OlderThan { days: 1 }, false);
        let report = BatchScheduler::new(MockConverter::new(), config).run(tasks).await;

        assert_eq!(report.summary.converted, 1);
        assert_eq!(report.summary.retirement_errors, 1);
        assert!(report.retirements[0].result.is_err());
    }

    #[tokio::test]
    async fn test_panicking_converter_reported_as_failure() {
        let dir = TempDir::new().unwrap();
        let tasks = sources(&dir, 2);
        let converter = MockConverter::new();
        converter.panic_on(&tasks[0].source).await;

        let report = BatchScheduler::new(converter, config(2)).run(tasks.clone()).await;

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.converted, 1);
        let failed = report.outcomes.iter().find(|o| !o.is_success()).unwrap();
        assert_eq!(failed.task, tasks[0]);
        assert!(matches!(failed.result, Err(ConversionError::WorkerAborted { .. })));
    }

    #[tokio::test]
    async fn test_empty_run() {
        let report = BatchScheduler::new(MockConverter::new(), config(4)).run(Vec::new()).await;
        assert_eq!(report.summary, Default::default());
        assert!(report.outcomes.is_empty());
    }
}

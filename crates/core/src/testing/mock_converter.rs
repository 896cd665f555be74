//! Mock converter for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{
    ConversionOutcome, ConversionTask, Converted, Converter, MetadataDisposition,
};
use crate::fits::{DecodeError, FormatError};
use crate::xisf::{Codec, CodecConfig, EncodeError};

/// Bytes the mock writes to each destination.
pub const MOCK_OUTPUT: &[u8] = b"XISF0100mock";

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track submitted tasks for assertions
/// - Fail, panic or drop metadata for chosen sources
/// - Simulate conversion time and measure peak concurrency
///
/// Successful conversions write [`MOCK_OUTPUT`] to the destination.
/// Clones share all state.
///
/// # Example
///
/// ```rust,ignore
/// use fitsbatch_core::testing::MockConverter;
///
/// let converter = MockConverter::new().with_delay(Duration::from_millis(20));
/// converter.fail_on("/raw/broken.fits").await;
///
/// let report = BatchScheduler::with_shared(Arc::new(converter.clone()), config).run(tasks).await;
/// assert!(converter.max_concurrency() <= 4);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockConverter {
    /// Tasks in submission order.
    tasks: Arc<RwLock<Vec<ConversionTask>>>,
    /// Sources whose conversion fails with a decode error.
    failures: Arc<RwLock<HashSet<PathBuf>>>,
    /// Sources converted without metadata.
    fallbacks: Arc<RwLock<HashSet<PathBuf>>>,
    /// Sources whose conversion panics.
    panics: Arc<RwLock<HashSet<PathBuf>>>,
    delay: Duration,
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MockConverter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep this long inside every conversion.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn fail_on(&self, source: impl AsRef<Path>) {
        self.failures.write().await.insert(source.as_ref().to_path_buf());
    }

    pub async fn drop_metadata_on(&self, source: impl AsRef<Path>) {
        self.fallbacks.write().await.insert(source.as_ref().to_path_buf());
    }

    pub async fn panic_on(&self, source: impl AsRef<Path>) {
        self.panics.write().await.insert(source.as_ref().to_path_buf());
    }

    /// All tasks received so far.
    pub async fn recorded_tasks(&self) -> Vec<ConversionTask> {
        self.tasks.read().await.clone()
    }

    pub async fn conversion_count(&self) -> usize {
        self.tasks.read().await.len()
    }

    /// Highest number of conversions seen running at once.
    pub fn max_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    async fn outcome(&self, task: ConversionTask) -> ConversionOutcome {
        if self.failures.read().await.contains(&task.source) {
            let error = DecodeError::format(&task.source, FormatError::NotFits);
            return ConversionOutcome::failed(task, error);
        }
        if self.panics.read().await.contains(&task.source) {
            panic!("mock conversion panicked on {}", task.source.display());
        }

        if let Err(e) = tokio::fs::write(&task.destination, MOCK_OUTPUT).await {
            let error = EncodeError::io(&task.destination, e);
            return ConversionOutcome::failed(task, error);
        }
        let metadata = if self.fallbacks.read().await.contains(&task.source) {
            MetadataDisposition::Dropped {
                reason: "mock rejected metadata".to_string(),
            }
        } else {
            MetadataDisposition::Attached { keywords: 1 }
        };
        ConversionOutcome::converted(
            task,
            Converted {
                bytes_written: MOCK_OUTPUT.len() as u64,
                codec_used: Codec::None,
                metadata,
            },
        )
    }
}

/// Decrements the active counter when a conversion ends, even by panic.
struct ActiveGuard<'a>(&'a AtomicUsize);

impl Drop for ActiveGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(&self, task: ConversionTask, _codec: &CodecConfig) -> ConversionOutcome {
        self.tasks.write().await.push(task.clone());

        let running = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = ActiveGuard(&self.active);
        self.peak.fetch_max(running, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome(task).await
    }
}

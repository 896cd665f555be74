//! Conversion of a single file.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::error::ConversionError;
use super::traits::Converter;
use super::types::{ConversionOutcome, ConversionTask, Converted, MetadataDisposition};
use crate::fits::{FitsDecoder, SourceDecoder};
use crate::metadata::normalize;
use crate::xisf::{CodecConfig, TargetEncoder, XisfEncoder};

/// Converts one file on the calling thread.
///
/// The encoder is retried once without metadata if, and only if, it reports
/// the metadata as incompatible.
pub fn convert_file<D, E>(
    decoder: &D,
    encoder: &E,
    task: &ConversionTask,
    codec: &CodecConfig,
) -> Result<Converted, ConversionError>
where
    D: SourceDecoder + ?Sized,
    E: TargetEncoder + ?Sized,
{
    let (image, header) = decoder.read(&task.source)?;
    let image = image.with_channel_axis();
    let record = normalize(&header);
    debug!(
        source = %task.source.display(),
        shape = ?image.shape(),
        keywords = record.entry_count(),
        "Decoded source"
    );

    match encoder.write(&task.destination, &image, Some(&record), codec) {
        Ok(report) => Ok(Converted {
            bytes_written: report.bytes_written,
            codec_used: report.codec_used,
            metadata: MetadataDisposition::Attached {
                keywords: record.entry_count(),
            },
        }),
        Err(e) if e.is_metadata_incompatible() => {
            warn!(
                source = %task.source.display(),
                error = %e,
                "Metadata rejected, writing image without it"
            );
            let report = encoder.write(&task.destination, &image, None, codec)?;
            Ok(Converted {
                bytes_written: report.bytes_written,
                codec_used: report.codec_used,
                metadata: MetadataDisposition::Dropped {
                    reason: e.to_string(),
                },
            })
        }
        Err(e) => Err(e.into()),
    }
}

/// FITS to XISF converter running each conversion on the blocking pool.
pub struct XisfConverter<D = FitsDecoder, E = XisfEncoder> {
    decoder: Arc<D>,
    encoder: Arc<E>,
}

impl XisfConverter {
    pub fn new() -> Self {
        Self::with_codecs(FitsDecoder::new(), XisfEncoder::new())
    }
}

impl Default for XisfConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl<D, E> XisfConverter<D, E> {
    /// Creates a converter with custom decoder and encoder implementations.
    pub fn with_codecs(decoder: D, encoder: E) -> Self {
        Self {
            decoder: Arc::new(decoder),
            encoder: Arc::new(encoder),
        }
    }
}

#[async_trait]
impl<D, E> Converter for XisfConverter<D, E>
where
    D: SourceDecoder + 'static,
    E: TargetEncoder + 'static,
{
    fn name(&self) -> &str {
        "xisf"
    }

    async fn convert(&self, task: ConversionTask, codec: &CodecConfig) -> ConversionOutcome {
        let decoder = Arc::clone(&self.decoder);
        let encoder = Arc::clone(&self.encoder);
        let codec = codec.clone();
        let job = task.clone();

        let result = tokio::task::spawn_blocking(move || {
            convert_file(decoder.as_ref(), encoder.as_ref(), &job, &codec)
        })
        .await
        .unwrap_or_else(|e| Err(ConversionError::from_join(e)));

        ConversionOutcome { task, result }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fits::{DecodeError, Header};
    use crate::image::Image;
    use crate::testing::fixtures::{inspect_xisf, FitsFixture};
    use crate::testing::MockEncoder;
    use crate::xisf::{Codec, EncodeError};
    use std::path::Path;
    use tempfile::TempDir;

    fn task_in(dir: &TempDir, name: &str) -> ConversionTask {
        ConversionTask::new(
            dir.path().join(format!("{name}.fits")),
            dir.path().join(format!("{name}.xisf")),
        )
    }

    fn light_frame(dir: &TempDir, name: &str) -> ConversionTask {
        let task = task_in(dir, name);
        FitsFixture::u16_image(4, 3, &(0..12u16).collect::<Vec<_>>())
            .card("OBJECT", "'M31'", Some("target"))
            .card("EXPTIME", "300.0", None)
            .write(&task.source)
            .unwrap();
        task
    }

    #[test]
    fn test_plane_gains_channel_axis() {
        let dir = TempDir::new().unwrap();
        let task = light_frame(&dir, "light");
        let encoder = MockEncoder::new();

        let converted = convert_file(&FitsDecoder::new(), &encoder, &task, &CodecConfig::default()).unwrap();
        assert!(converted.metadata.is_attached());

        let writes = encoder.writes();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].shape, vec![3, 4, 1]);
        assert!(writes[0].with_metadata);
    }

    #[test]
    fn test_metadata_rejection_falls_back_once() {
        let dir = TempDir::new().unwrap();
        let task = light_frame(&dir, "light");
        let encoder = MockEncoder::rejecting_metadata();

        let converted = convert_file(&FitsDecoder::new(), &encoder, &task, &CodecConfig::default()).unwrap();
        assert!(matches!(converted.metadata, MetadataDisposition::Dropped { .. }));

        let writes = encoder.writes();
        assert_eq!(writes.len(), 2);
        assert!(writes[0].with_metadata);
        assert!(!writes[1].with_metadata);
        assert_eq!(writes[0].shape, writes[1].shape);
        assert!(task.destination.exists());
    }

    #[test]
    fn test_other_write_errors_are_not_retried() {
        let dir = TempDir::new().unwrap();
        let task = light_frame(&dir, "light");
        let encoder = MockEncoder::failing_io();

        let err = convert_file(&FitsDecoder::new(), &encoder, &task, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, ConversionError::Encode(EncodeError::Io { .. })));
        assert_eq!(err.kind(), "encode");
        assert_eq!(encoder.writes().len(), 1);
    }

    #[test]
    fn test_decode_failure_skips_encoder() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir, "broken");
        std::fs::write(&task.source, b"not a fits file").unwrap();
        let encoder = MockEncoder::new();

        let err = convert_file(&FitsDecoder::new(), &encoder, &task, &CodecConfig::default()).unwrap_err();
        assert!(matches!(err, ConversionError::Decode(_)));
        assert!(encoder.writes().is_empty());
        assert!(!task.destination.exists());
    }

    #[tokio::test]
    async fn test_xisf_converter_writes_file() {
        let dir = TempDir::new().unwrap();
        let task = light_frame(&dir, "light");

        let outcome = XisfConverter::new().convert(task.clone(), &CodecConfig::default()).await;
        let converted = outcome.result.unwrap();
        // SIMPLE, BITPIX, NAXIS, NAXIS1, NAXIS2, BZERO, OBJECT, EXPTIME
        assert_eq!(converted.metadata, MetadataDisposition::Attached { keywords: 8 });
        assert_eq!(converted.codec_used, Codec::Zlib);
        assert_eq!(outcome.task, task);

        let xisf = inspect_xisf(&task.destination).unwrap();
        assert_eq!(xisf.geometry, "4:3:1");
        assert_eq!(xisf.data_u16(), (0..12).collect::<Vec<u16>>());
    }

    struct PanickingDecoder;

    impl SourceDecoder for PanickingDecoder {
        fn name(&self) -> &str {
            "panicking"
        }

        fn read(&self, _path: &Path) -> Result<(Image, Header), DecodeError> {
            panic!("decoder exploded")
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_outcome() {
        let dir = TempDir::new().unwrap();
        let task = task_in(&dir, "boom");
        let converter = XisfConverter::with_codecs(PanickingDecoder, MockEncoder::new());

        let outcome = converter.convert(task, &CodecConfig::default()).await;
        match outcome.result {
            Err(ConversionError::WorkerAborted { reason }) => assert_eq!(reason, "decoder exploded"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}

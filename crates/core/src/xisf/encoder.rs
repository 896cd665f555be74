//! Monolithic XISF writer.

use chrono::{SecondsFormat, Utc};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::compression::{compress, shuffle};
use super::error::EncodeError;
use super::header::{build_header, check_metadata, BlockCompression, FileProperties, ImageDescriptor};
use super::traits::TargetEncoder;
use super::types::{Codec, CodecConfig, SampleFormat, WriteReport};
use super::SIGNATURE;
use crate::image::{Image, Pixels};
use crate::metadata::MetadataRecord;

/// Signature, header length and reserved field.
const PREAMBLE_LEN: usize = 16;

/// Attached blocks start on a multiple of this many bytes.
const BLOCK_ALIGNMENT: usize = 4096;

/// Suffix of the file written before it is renamed into place.
const PARTIAL_SUFFIX: &str = "part";

/// XISF encoder writing to the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct XisfEncoder;

impl XisfEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the complete header for a block, iterating until the block
    /// position written in the header no longer moves.
    fn layout(
        mut descriptor: ImageDescriptor,
        metadata: Option<&MetadataRecord>,
        properties: &FileProperties<'_>,
    ) -> Result<(Vec<u8>, usize), EncodeError> {
        for _ in 0..8 {
            let xml = build_header(&descriptor, metadata, properties)?;
            let position = align(PREAMBLE_LEN + xml.len());
            if position == descriptor.position {
                return Ok((xml, position));
            }
            descriptor.position = position;
        }
        Err(EncodeError::Header {
            reason: "block position did not settle".to_string(),
        })
    }

    fn write_file(path: &Path, xml: &[u8], position: usize, block: &[u8]) -> std::io::Result<()> {
        let header_len = u32::try_from(xml.len())
            .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "XML header too large"))?;
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(SIGNATURE)?;
        out.write_all(&header_len.to_le_bytes())?;
        out.write_all(&[0u8; 4])?;
        out.write_all(xml)?;
        out.write_all(&vec![0u8; position - PREAMBLE_LEN - xml.len()])?;
        out.write_all(block)?;
        out.into_inner().map_err(|e| e.into_error())?.sync_all()
    }
}

impl TargetEncoder for XisfEncoder {
    fn name(&self) -> &str {
        "xisf"
    }

    fn write(
        &self,
        path: &Path,
        image: &Image,
        metadata: Option<&MetadataRecord>,
        codec: &CodecConfig,
    ) -> Result<WriteReport, EncodeError> {
        let (height, width, channels) = match image.shape() {
            [h, w, c] if *h > 0 && *w > 0 && *c > 0 => (*h, *w, *c),
            other => {
                return Err(EncodeError::UnsupportedGeometry {
                    shape: other.to_vec(),
                })
            }
        };
        if let Some(record) = metadata {
            check_metadata(record)?;
        }

        let (sample_format, raw) = planar_samples(image.pixels(), height * width, channels)?;
        let bounds = sample_format.is_float().then(|| float_bounds(image.pixels()));
        let (block, compression) = encode_block(raw, sample_format, codec)?;

        let properties = FileProperties {
            creator_app: &codec.creator_app,
            creation_time: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            codec: compression.as_ref().map(|c| (c.codec, codec.level)),
        };
        let report = WriteReport {
            bytes_written: 0,
            codec_used: compression.as_ref().map_or(Codec::None, |c| c.codec),
            shuffled: compression
                .as_ref()
                .is_some_and(|c| c.shuffle_item_size.is_some()),
        };
        let descriptor = ImageDescriptor {
            width,
            height,
            channels,
            sample_format,
            bounds,
            position: 0,
            size: block.len(),
            compression,
        };
        let (xml, position) = Self::layout(descriptor, metadata, &properties)?;

        let partial = partial_path(path);
        if let Err(e) = Self::write_file(&partial, &xml, position, &block) {
            let _ = fs::remove_file(&partial);
            return Err(EncodeError::io(path, e));
        }
        fs::rename(&partial, path).map_err(|e| {
            let _ = fs::remove_file(&partial);
            EncodeError::io(path, e)
        })?;

        Ok(WriteReport {
            bytes_written: (position + block.len()) as u64,
            ..report
        })
    }
}

fn align(len: usize) -> usize {
    len.div_ceil(BLOCK_ALIGNMENT) * BLOCK_ALIGNMENT
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

/// Converts row-major interleaved samples to little-endian planar bytes.
///
/// Signed integers have no XISF sample format and are widened to floats,
/// which represent every `i16` and `i32` value exactly.
fn planar_samples(
    pixels: &Pixels,
    plane_len: usize,
    channels: usize,
) -> Result<(SampleFormat, Vec<u8>), EncodeError> {
    Ok(match pixels {
        Pixels::U8(v) => (SampleFormat::UInt8, planar(v, plane_len, channels, |x: u8| [x])),
        Pixels::U16(v) => (SampleFormat::UInt16, planar(v, plane_len, channels, u16::to_le_bytes)),
        Pixels::U32(v) => (SampleFormat::UInt32, planar(v, plane_len, channels, u32::to_le_bytes)),
        Pixels::F32(v) => (SampleFormat::Float32, planar(v, plane_len, channels, f32::to_le_bytes)),
        Pixels::F64(v) => (SampleFormat::Float64, planar(v, plane_len, channels, f64::to_le_bytes)),
        Pixels::I16(v) => (
            SampleFormat::Float32,
            planar(v, plane_len, channels, |x: i16| f32::from(x).to_le_bytes()),
        ),
        Pixels::I32(v) => (
            SampleFormat::Float64,
            planar(v, plane_len, channels, |x: i32| f64::from(x).to_le_bytes()),
        ),
        other @ (Pixels::I64(_) | Pixels::U64(_)) => {
            return Err(EncodeError::UnsupportedSampleFormat {
                sample: other.sample_type(),
            })
        }
    })
}

/// Range of a float image: `0:1` unless the finite samples fall outside it.
fn float_bounds(pixels: &Pixels) -> (f64, f64) {
    let samples: Box<dyn Iterator<Item = f64> + '_> = match pixels {
        Pixels::F32(v) => Box::new(v.iter().map(|x| f64::from(*x))),
        Pixels::F64(v) => Box::new(v.iter().copied()),
        Pixels::I16(v) => Box::new(v.iter().map(|x| f64::from(*x))),
        Pixels::I32(v) => Box::new(v.iter().map(|x| f64::from(*x))),
        _ => Box::new(std::iter::empty()),
    };
    samples
        .filter(|x| x.is_finite())
        .fold((0.0_f64, 1.0_f64), |(low, high), x| (low.min(x), high.max(x)))
}

fn planar<T: Copy, const N: usize>(
    samples: &[T],
    plane_len: usize,
    channels: usize,
    to_le: impl Fn(T) -> [u8; N],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(samples.len() * N);
    for channel in 0..channels {
        for pixel in 0..plane_len {
            out.extend_from_slice(&to_le(samples[pixel * channels + channel]));
        }
    }
    out
}

/// Compresses the block, keeping it raw when compression does not shrink it.
fn encode_block(
    raw: Vec<u8>,
    sample_format: SampleFormat,
    codec: &CodecConfig,
) -> Result<(Vec<u8>, Option<BlockCompression>), EncodeError> {
    if codec.codec == Codec::None || raw.is_empty() {
        return Ok((raw, None));
    }

    let item_size = sample_format.item_size();
    let shuffled = codec.shuffle && item_size > 1;
    let compressed = if shuffled {
        compress(codec.codec, codec.level, &shuffle(&raw, item_size))?
    } else {
        compress(codec.codec, codec.level, &raw)?
    };

    if compressed.len() >= raw.len() {
        return Ok((raw, None));
    }
    let compression = BlockCompression {
        codec: codec.codec,
        uncompressed_size: raw.len(),
        shuffle_item_size: shuffled.then_some(item_size),
    };
    Ok((compressed, Some(compression)))
}

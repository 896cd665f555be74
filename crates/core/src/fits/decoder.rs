//! FITS file decoder.

use std::path::Path;

use super::card::{parse_card, ParsedCard};
use super::error::{DecodeError, FormatError};
use super::traits::SourceDecoder;
use super::types::{Header, HeaderValue};
use super::{BLOCK_SIZE, CARD_SIZE};
use crate::image::{Image, Pixels};

/// Decoder for FITS files on the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FitsDecoder;

impl FitsDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decodes FITS bytes already in memory.
    pub fn decode(bytes: &[u8]) -> Result<Option<(Image, Header)>, FormatError> {
        let mut offset = 0;
        let primary = read_header(bytes, &mut offset)?;
        if primary.get("SIMPLE").and_then(HeaderValue::as_logical) != Some(true) {
            return Err(FormatError::NotFits);
        }

        let mut current = primary.clone();
        let mut is_image = true;
        loop {
            let layout = DataLayout::from_header(&current)?;
            let data_start = offset;
            let data_end = match data_start.checked_add(layout.byte_len) {
                Some(end) if end <= bytes.len() => end,
                _ => {
                    return Err(FormatError::Truncated {
                        offset: data_start,
                        needed: layout.byte_len,
                        available: bytes.len().saturating_sub(data_start),
                    })
                }
            };

            if is_image && layout.sample_count > 0 {
                let image = layout.decode(&current, &bytes[data_start..data_end])?;
                return Ok(Some((image, primary)));
            }

            offset = padded(data_end);
            if offset >= bytes.len() {
                return Ok(None);
            }
            current = read_header(bytes, &mut offset)?;
            is_image = current.get("XTENSION").and_then(HeaderValue::as_text) == Some("IMAGE");
        }
    }
}

impl SourceDecoder for FitsDecoder {
    fn name(&self) -> &str {
        "fits"
    }

    fn read(&self, path: &Path) -> Result<(Image, Header), DecodeError> {
        let bytes = std::fs::read(path).map_err(|e| DecodeError::io(path, e))?;
        match Self::decode(&bytes) {
            Ok(Some(decoded)) => Ok(decoded),
            Ok(None) => Err(DecodeError::NoImageData {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(DecodeError::format(path, e)),
        }
    }
}

/// Rounds up to the next block boundary.
fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}

/// Reads header cards from `offset` up to END and moves `offset` past the header blocks.
fn read_header(bytes: &[u8], offset: &mut usize) -> Result<Header, FormatError> {
    let start = *offset;
    let mut header = Header::new();
    let mut pos = start;

    while pos + CARD_SIZE <= bytes.len() {
        match parse_card(&bytes[pos..pos + CARD_SIZE]) {
            ParsedCard::End => {
                *offset = padded(pos + CARD_SIZE);
                return Ok(header);
            }
            ParsedCard::Blank => {}
            ParsedCard::Continue { text, comment } => append_continuation(&mut header, text, comment),
            ParsedCard::Card(card) => header.push(card),
        }
        pos += CARD_SIZE;
    }

    Err(FormatError::MissingEnd { offset: start })
}

/// Joins a CONTINUE card onto a preceding long string ending in `&`.
fn append_continuation(header: &mut Header, text: String, comment: Option<String>) {
    if let Some(card) = header.last_mut() {
        if let HeaderValue::Text(previous) = &mut card.value {
            if let Some(stripped) = previous.strip_suffix('&') {
                *previous = format!("{stripped}{text}");
                if let Some(comment) = comment.filter(|c| !c.is_empty()) {
                    card.comment = Some(match card.comment.take() {
                        Some(existing) if !existing.is_empty() => format!("{existing} {comment}"),
                        _ => comment,
                    });
                }
                return;
            }
        }
    }
    header.push(super::types::HeaderCard::new(
        "CONTINUE",
        HeaderValue::Text(text),
        comment,
    ));
}

/// Size and element type of an HDU's data unit.
struct DataLayout {
    bitpix: i64,
    axes: Vec<usize>,
    sample_count: usize,
    /// Size of the data unit without padding, group parameters included.
    byte_len: usize,
}

impl DataLayout {
    fn from_header(header: &Header) -> Result<Self, FormatError> {
        let bitpix = required_integer(header, "BITPIX")?;
        if !matches!(bitpix, 8 | 16 | 32 | 64 | -32 | -64) {
            return Err(FormatError::UnsupportedBitpix { bitpix });
        }

        let naxis = required_integer(header, "NAXIS")?;
        let axes = (1..=naxis)
            .map(|n| {
                let keyword = format!("NAXIS{n}");
                header
                    .integer(&keyword)
                    .and_then(|v| usize::try_from(v).ok())
                    .ok_or(FormatError::MissingKeyword { keyword })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pcount = header
            .integer("PCOUNT")
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(0);
        let gcount = header
            .integer("GCOUNT")
            .and_then(|v| usize::try_from(v).ok())
            .unwrap_or(1);

        let bytes_per_sample = (bitpix.unsigned_abs() / 8) as usize;
        let (sample_count, byte_len) = if axes.is_empty() {
            (0, 0)
        } else {
            let sizes = axes
                .iter()
                .try_fold(1usize, |count, axis| count.checked_mul(*axis))
                .and_then(|count| {
                    let byte_len = count
                        .checked_add(pcount)?
                        .checked_mul(gcount)?
                        .checked_mul(bytes_per_sample)?;
                    Some((count, byte_len))
                });
            sizes.ok_or_else(|| FormatError::Oversized {
                bitpix,
                axes: axes.clone(),
            })?
        };

        Ok(Self {
            bitpix,
            axes,
            sample_count,
            byte_len,
        })
    }

    fn bytes_per_sample(&self) -> usize {
        (self.bitpix.unsigned_abs() / 8) as usize
    }

    /// Decodes big-endian samples, applying BZERO/BSCALE.
    fn decode(&self, header: &Header, data: &[u8]) -> Result<Image, FormatError> {
        let bzero = header.real("BZERO").unwrap_or(0.0);
        let bscale = header.real("BSCALE").unwrap_or(1.0);
        let raw = &data[..self.sample_count * self.bytes_per_sample()];
        let identity = bzero == 0.0 && bscale == 1.0;

        let pixels = match self.bitpix {
            8 if identity => Pixels::U8(raw.to_vec()),
            8 => Pixels::F32(raw.iter().map(|v| scale(*v as f64, bscale, bzero) as f32).collect()),
            16 => {
                let v: Vec<i16> = be_samples(raw, i16::from_be_bytes);
                if identity {
                    Pixels::I16(v)
                } else if bscale == 1.0 && bzero == 32768.0 {
                    Pixels::U16(v.into_iter().map(|x| (x as u16) ^ 0x8000).collect())
                } else {
                    Pixels::F32(v.into_iter().map(|x| scale(x as f64, bscale, bzero) as f32).collect())
                }
            }
            32 => {
                let v: Vec<i32> = be_samples(raw, i32::from_be_bytes);
                if identity {
                    Pixels::I32(v)
                } else if bscale == 1.0 && bzero == 2_147_483_648.0 {
                    Pixels::U32(v.into_iter().map(|x| (x as u32) ^ 0x8000_0000).collect())
                } else {
                    Pixels::F64(v.into_iter().map(|x| scale(x as f64, bscale, bzero)).collect())
                }
            }
            64 => {
                let v: Vec<i64> = be_samples(raw, i64::from_be_bytes);
                if identity {
                    Pixels::I64(v)
                } else if bscale == 1.0 && bzero == 9_223_372_036_854_775_808.0 {
                    Pixels::U64(v.into_iter().map(|x| (x as u64) ^ (1 << 63)).collect())
                } else {
                    Pixels::F64(v.into_iter().map(|x| scale(x as f64, bscale, bzero)).collect())
                }
            }
            -32 => {
                let v: Vec<f32> = be_samples(raw, f32::from_be_bytes);
                if identity {
                    Pixels::F32(v)
                } else {
                    Pixels::F32(v.into_iter().map(|x| scale(x as f64, bscale, bzero) as f32).collect())
                }
            }
            _ => {
                let v: Vec<f64> = be_samples(raw, f64::from_be_bytes);
                if identity {
                    Pixels::F64(v)
                } else {
                    Pixels::F64(v.into_iter().map(|x| scale(x, bscale, bzero)).collect())
                }
            }
        };

        // NAXIS1 varies fastest, so it is the last axis of the shape.
        let shape = self.axes.iter().rev().copied().collect();
        Ok(Image::new(shape, pixels)?)
    }
}

fn scale(value: f64, bscale: f64, bzero: f64) -> f64 {
    value * bscale + bzero
}

fn be_samples<T, const N: usize>(raw: &[u8], from_be: fn([u8; N]) -> T) -> Vec<T> {
    raw.chunks_exact(N)
        .map(|chunk| {
            let mut bytes = [0u8; N];
            bytes.copy_from_slice(chunk);
            from_be(bytes)
        })
        .collect()
}

fn required_integer(header: &Header, keyword: &str) -> Result<i64, FormatError> {
    header
        .integer(keyword)
        .ok_or_else(|| FormatError::MissingKeyword {
            keyword: keyword.to_string(),
        })
}

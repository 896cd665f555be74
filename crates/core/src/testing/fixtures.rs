//! Test fixtures: a FITS writer and an XISF reader.

use anyhow::{anyhow, bail, Context};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

use crate::fits::{BLOCK_SIZE, CARD_SIZE};
use crate::xisf::{decompress, unshuffle, Codec, SIGNATURE};

/// Builder for single-HDU FITS files.
#[derive(Debug, Clone)]
pub struct FitsFixture {
    bitpix: i32,
    /// NAXIS1 first.
    axes: Vec<usize>,
    extension: bool,
    cards: Vec<String>,
    data: Option<Vec<u8>>,
}

impl FitsFixture {
    /// An HDU with the given BITPIX and axes (NAXIS1 first) and zeroed data.
    pub fn new(bitpix: i32, axes: &[usize]) -> Self {
        Self {
            bitpix,
            axes: axes.to_vec(),
            extension: false,
            cards: Vec::new(),
            data: None,
        }
    }

    /// A 16-bit unsigned plane, stored with `BZERO = 32768`.
    pub fn u16_image(width: usize, height: usize, pixels: &[u16]) -> Self {
        let data = pixels.iter().flat_map(|v| (v ^ 0x8000).to_be_bytes()).collect();
        Self::new(16, &[width, height])
            .card("BZERO", "32768", None)
            .data(data)
    }

    /// A 32-bit float image with the given axes (NAXIS1 first).
    pub fn f32_image(axes: &[usize], pixels: &[f32]) -> Self {
        let data = pixels.iter().flat_map(|v| v.to_be_bytes()).collect();
        Self::new(-32, axes).data(data)
    }

    /// Adds a `KEY = value / comment` card; `value` is the literal FITS text.
    pub fn card(mut self, keyword: &str, value: &str, comment: Option<&str>) -> Self {
        let mut card = format!("{keyword:<8}= {value:>20}");
        if let Some(comment) = comment {
            card.push_str(" / ");
            card.push_str(comment);
        }
        self.cards.push(card);
        self
    }

    /// Adds a card exactly as given.
    pub fn raw_card(mut self, card: &str) -> Self {
        self.cards.push(card.to_string());
        self
    }

    /// Raw big-endian data unit, without padding.
    pub fn data(mut self, data: Vec<u8>) -> Self {
        self.data = Some(data);
        self
    }

    /// Writes the HDU as an `IMAGE` extension instead of a primary HDU.
    pub fn as_extension(mut self) -> Self {
        self.extension = true;
        self
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = Vec::new();
        if self.extension {
            push_card(&mut header, "XTENSION= 'IMAGE   '");
        } else {
            push_card(&mut header, &format!("{:<8}= {:>20}", "SIMPLE", "T"));
        }
        push_card(&mut header, &format!("{:<8}= {:>20}", "BITPIX", self.bitpix));
        push_card(&mut header, &format!("{:<8}= {:>20}", "NAXIS", self.axes.len()));
        for (i, axis) in self.axes.iter().enumerate() {
            push_card(&mut header, &format!("{:<8}= {:>20}", format!("NAXIS{}", i + 1), axis));
        }
        if self.extension {
            push_card(&mut header, &format!("{:<8}= {:>20}", "PCOUNT", 0));
            push_card(&mut header, &format!("{:<8}= {:>20}", "GCOUNT", 1));
        }
        for card in &self.cards {
            push_card(&mut header, card);
        }
        push_card(&mut header, "END");
        pad(&mut header, b' ');

        let mut data = match &self.data {
            Some(data) => data.clone(),
            None if self.axes.is_empty() => Vec::new(),
            None => {
                let samples: usize = self.axes.iter().product();
                vec![0; samples * (self.bitpix.unsigned_abs() as usize / 8)]
            }
        };
        pad(&mut data, 0);

        header.extend(data);
        header
    }

    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.to_bytes())
    }
}

fn push_card(header: &mut Vec<u8>, card: &str) {
    assert!(card.len() <= CARD_SIZE, "card longer than {CARD_SIZE} bytes: {card}");
    header.extend_from_slice(card.as_bytes());
    header.resize(header.len() + CARD_SIZE - card.len(), b' ');
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let padded = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    bytes.resize(padded, fill);
}

/// What a test needs to know about a written XISF file.
#[derive(Debug, Clone, Default)]
pub struct XisfInspection {
    pub geometry: String,
    pub sample_format: String,
    pub color_space: String,
    /// `bounds` attribute of float images.
    pub bounds: Option<String>,
    pub compression: Option<String>,
    /// `(name, value, comment)` in header order.
    pub keywords: Vec<(String, String, String)>,
    /// `Property` values by id.
    pub properties: HashMap<String, String>,
    /// Decompressed, unshuffled pixel block.
    pub data: Vec<u8>,
}

impl XisfInspection {
    pub fn data_u16(&self) -> Vec<u16> {
        self.data
            .chunks_exact(2)
            .map(|c| u16::from_le_bytes([c[0], c[1]]))
            .collect()
    }

    pub fn data_f32(&self) -> Vec<f32> {
        self.data
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect()
    }

    /// Value of the first keyword with this name.
    pub fn keyword(&self, name: &str) -> Option<&str> {
        self.keywords
            .iter()
            .find(|(key, _, _)| key == name)
            .map(|(_, value, _)| value.as_str())
    }
}

/// Reads a monolithic XISF file written by this crate.
pub fn inspect_xisf(path: &Path) -> anyhow::Result<XisfInspection> {
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if bytes.len() < 16 || &bytes[..8] != SIGNATURE {
        bail!("{} is not an XISF file", path.display());
    }
    let header_len = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    let xml = bytes
        .get(16..16 + header_len)
        .ok_or_else(|| anyhow!("header runs past end of file"))?;
    let xml = std::str::from_utf8(xml).context("header is not UTF-8")?;

    let mut inspection = XisfInspection::default();
    let mut location = None;
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e) => {
                let attrs = attributes(&e)?;
                match e.name().as_ref() {
                    b"Image" => {
                        inspection.geometry = attrs.get("geometry").cloned().unwrap_or_default();
                        inspection.sample_format =
                            attrs.get("sampleFormat").cloned().unwrap_or_default();
                        inspection.color_space = attrs.get("colorSpace").cloned().unwrap_or_default();
                        inspection.compression = attrs.get("compression").cloned();
                        inspection.bounds = attrs.get("bounds").cloned();
                        location = attrs.get("location").cloned();
                    }
                    b"FITSKeyword" => inspection.keywords.push((
                        attrs.get("name").cloned().unwrap_or_default(),
                        attrs.get("value").cloned().unwrap_or_default(),
                        attrs.get("comment").cloned().unwrap_or_default(),
                    )),
                    b"Property" => {
                        if let (Some(id), Some(value)) = (attrs.get("id"), attrs.get("value")) {
                            inspection.properties.insert(id.clone(), value.clone());
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    let location = location.ok_or_else(|| anyhow!("no Image element"))?;
    let (position, size) = parse_location(&location)?;
    let block = bytes
        .get(position..position + size)
        .ok_or_else(|| anyhow!("block {location} runs past end of file"))?;

    inspection.data = match &inspection.compression {
        None => block.to_vec(),
        Some(compression) => {
            let (codec, uncompressed, item_size) = parse_compression(compression)?;
            let data = decompress(codec, block, uncompressed)?;
            match item_size {
                Some(item_size) => unshuffle(&data, item_size),
                None => data,
            }
        }
    };
    Ok(inspection)
}

fn attributes(element: &BytesStart<'_>) -> anyhow::Result<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr?;
        let key = String::from_utf8(attr.key.as_ref().to_vec())?;
        attrs.insert(key, attr.unescape_value()?.into_owned());
    }
    Ok(attrs)
}

/// `attachment:position:size`
fn parse_location(location: &str) -> anyhow::Result<(usize, usize)> {
    let mut parts = location.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some("attachment"), Some(position), Some(size)) => Ok((position.parse()?, size.parse()?)),
        _ => bail!("unsupported location {location}"),
    }
}

/// `codec[+sh]:uncompressed[:item_size]`
fn parse_compression(compression: &str) -> anyhow::Result<(Codec, usize, Option<usize>)> {
    let mut parts = compression.split(':');
    let name = parts.next().unwrap_or_default();
    let uncompressed = parts
        .next()
        .ok_or_else(|| anyhow!("missing size in {compression}"))?
        .parse()?;
    let (name, shuffled) = match name.strip_suffix("+sh") {
        Some(name) => (name, true),
        None => (name, false),
    };
    let codec = match name {
        "zlib" => Codec::Zlib,
        "lz4" => Codec::Lz4,
        "zstd" => Codec::Zstd,
        other => bail!("unknown codec {other}"),
    };
    let item_size = if shuffled {
        Some(
            parts
                .next()
                .ok_or_else(|| anyhow!("missing item size in {compression}"))?
                .parse()?,
        )
    } else {
        None
    };
    Ok((codec, uncompressed, item_size))
}

//! Pixel block compression and byte shuffling.

use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

use super::error::EncodeError;
use super::types::Codec;

/// Groups the i-th byte of every item together.
///
/// Bytes past the last whole item are copied unchanged.
pub(crate) fn shuffle(data: &[u8], item_size: usize) -> Vec<u8> {
    if item_size <= 1 {
        return data.to_vec();
    }
    let items = data.len() / item_size;
    let mut out = vec![0u8; data.len()];
    for i in 0..items {
        for j in 0..item_size {
            out[j * items + i] = data[i * item_size + j];
        }
    }
    out[items * item_size..].copy_from_slice(&data[items * item_size..]);
    out
}

/// Inverse of [`shuffle`].
pub(crate) fn unshuffle(data: &[u8], item_size: usize) -> Vec<u8> {
    if item_size <= 1 {
        return data.to_vec();
    }
    let items = data.len() / item_size;
    let mut out = vec![0u8; data.len()];
    for i in 0..items {
        for j in 0..item_size {
            out[i * item_size + j] = data[j * items + i];
        }
    }
    out[items * item_size..].copy_from_slice(&data[items * item_size..]);
    out
}

/// Compresses a block with the given codec.
pub(crate) fn compress(codec: Codec, level: i32, data: &[u8]) -> Result<Vec<u8>, EncodeError> {
    let failed = |source: std::io::Error| EncodeError::Compression { codec, source };
    match codec {
        Codec::None => Ok(data.to_vec()),
        Codec::Zlib => {
            let level = u32::try_from(level).unwrap_or(6).min(9);
            let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::new(level));
            encoder.write_all(data).map_err(failed)?;
            encoder.finish().map_err(failed)
        }
        Codec::Lz4 => Ok(lz4_flex::block::compress(data)),
        Codec::Zstd => zstd::bulk::compress(data, level).map_err(failed),
    }
}

/// Decompresses a block back to `uncompressed_size` bytes.
pub(crate) fn decompress(
    codec: Codec,
    data: &[u8],
    uncompressed_size: usize,
) -> std::io::Result<Vec<u8>> {
    match codec {
        Codec::None => Ok(data.to_vec()),
        Codec::Zlib => {
            let mut out = Vec::with_capacity(uncompressed_size);
            ZlibDecoder::new(data).read_to_end(&mut out)?;
            Ok(out)
        }
        Codec::Lz4 => lz4_flex::block::decompress(data, uncompressed_size)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
        Codec::Zstd => zstd::bulk::decompress(data, uncompressed_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shuffle_layout() {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let shuffled = shuffle(&data, 2);
        assert_eq!(shuffled, vec![1, 3, 5, 2, 4, 6, 7]);
        assert_eq!(unshuffle(&shuffled, 2), data.to_vec());
    }

    #[test]
    fn test_shuffle_single_byte_items_is_identity() {
        let data = [9u8, 8, 7];
        assert_eq!(shuffle(&data, 1), data.to_vec());
    }

    #[test]
    fn test_codecs_restore_data() {
        let data: Vec<u8> = (0..4096u32).flat_map(|v| ((v % 97) as u16).to_le_bytes()).collect();
        for codec in [Codec::Zlib, Codec::Lz4, Codec::Zstd] {
            let compressed = compress(codec, 3, &data).unwrap();
            assert!(compressed.len() < data.len(), "{codec} did not compress");
            assert_eq!(decompress(codec, &compressed, data.len()).unwrap(), data);
        }
    }
}

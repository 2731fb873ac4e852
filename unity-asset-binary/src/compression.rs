//! Storage-block compression used by archive bodies.
//!
//! Every storage block in an archive's blocks-info table carries its own
//! compression type in the low six bits of its flags word. `decompress`
//! is the single entry point the bundle reader calls per block.

use crate::error::{BinaryError, Result};
use std::io::Read;

/// Compression types a storage block may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionType {
    None = 0,
    Lzma = 1,
    Lz4 = 2,
    Lz4Hc = 3,
    Lzham = 4,
    Brotli = 5,
}

impl CompressionType {
    /// Decode from a storage block's flags word (low 6 bits).
    pub fn from_flags(flags: u32) -> Result<Self> {
        match flags & 0x3F {
            0 => Ok(CompressionType::None),
            1 => Ok(CompressionType::Lzma),
            2 => Ok(CompressionType::Lz4),
            3 => Ok(CompressionType::Lz4Hc),
            4 => Ok(CompressionType::Lzham),
            5 => Ok(CompressionType::Brotli),
            other => Err(BinaryError::format(format!(
                "unknown compression type in flags: {other}"
            ))),
        }
    }

    pub fn is_supported(self) -> bool {
        !matches!(self, CompressionType::Lzham)
    }

    pub fn name(self) -> &'static str {
        match self {
            CompressionType::None => "None",
            CompressionType::Lzma => "LZMA",
            CompressionType::Lz4 => "LZ4",
            CompressionType::Lz4Hc => "LZ4HC",
            CompressionType::Lzham => "LZHAM",
            CompressionType::Brotli => "Brotli",
        }
    }
}

/// Decompress one storage block's payload.
pub fn decompress(
    data: &[u8],
    compression: CompressionType,
    uncompressed_size: usize,
) -> Result<Vec<u8>> {
    match compression {
        CompressionType::None => Ok(data.to_vec()),
        CompressionType::Lz4 | CompressionType::Lz4Hc => decompress_lz4(data, uncompressed_size),
        CompressionType::Lzma => decompress_lzma(data, uncompressed_size),
        CompressionType::Brotli => decompress_brotli(data),
        CompressionType::Lzham => Err(BinaryError::format("LZHAM compression is not supported")),
    }
}

/// Unity stores LZ4 blocks in the raw block format (no frame header), with
/// the uncompressed size already known from the block table.
fn decompress_lz4(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    Ok(lz4_flex::decompress(data, uncompressed_size)?)
}

/// Unity's LZMA blocks carry a 5-byte raw-stream header (1 properties byte
/// + 4-byte little-endian dictionary size) with no size field, followed
/// directly by the compressed stream; the uncompressed size comes from the
/// block table instead.
fn decompress_lzma(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if data.len() < 5 {
        return Err(BinaryError::corrupt(
            "LZMA block shorter than its 5-byte header",
        ));
    }
    let properties = lzma_rs::decompress::raw::LzmaProperties::decode_properties(data[0])
        .map_err(BinaryError::Lzma)?;
    let dict_size = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let params = lzma_rs::decompress::raw::LzmaParams::new(
        properties,
        dict_size,
        Some(uncompressed_size as u64),
    );
    let mut decoder =
        lzma_rs::decompress::raw::LzmaDecoder::new(params, None).map_err(BinaryError::Lzma)?;
    let mut output = Vec::with_capacity(uncompressed_size);
    let mut input = std::io::Cursor::new(&data[5..]);
    decoder
        .decode(&mut input, &mut output)
        .map_err(BinaryError::Lzma)?;
    Ok(output)
}

fn decompress_brotli(data: &[u8]) -> Result<Vec<u8>> {
    let mut decompressed = Vec::new();
    brotli::Decompressor::new(data, 4096)
        .read_to_end(&mut decompressed)
        .map_err(|e| BinaryError::decompress(format!("brotli: {e}")))?;
    Ok(decompressed)
}

/// One entry in an archive's blocks-info table.
#[derive(Debug, Clone)]
pub struct CompressionBlock {
    pub uncompressed_size: u32,
    pub compressed_size: u32,
    pub flags: u16,
}

impl CompressionBlock {
    pub fn new(uncompressed_size: u32, compressed_size: u32, flags: u16) -> Self {
        Self {
            uncompressed_size,
            compressed_size,
            flags,
        }
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        CompressionType::from_flags(self.flags as u32)
    }

    pub fn is_compressed(&self) -> bool {
        self.uncompressed_size != self.compressed_size
    }

    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        if data.len() != self.compressed_size as usize {
            return Err(BinaryError::corrupt(format!(
                "block data size mismatch: expected {}, got {}",
                self.compressed_size,
                data.len()
            )));
        }
        let compression = self.compression_type()?;
        decompress(data, compression, self.uncompressed_size as usize)
    }
}

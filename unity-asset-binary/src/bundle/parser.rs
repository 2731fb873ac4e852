//! Archive-open pipeline: header, blocks-info, per-block decompression.

use tracing::debug;

use crate::compression::{decompress, CompressionType};
use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};

use super::header::ArchiveHeader;
use super::types::{parse_directory, BlocksInfo};
use super::{AssetBundle, BundleLoadOptions};

pub fn parse(data: &[u8], options: &BundleLoadOptions) -> Result<AssetBundle> {
    let mut reader = BinaryReader::new(data, ByteOrder::Big);
    let header = ArchiveHeader::parse(&mut reader)?;
    debug!(
        signature = %header.signature,
        version = header.version,
        flags = header.flags,
        "parsed archive header"
    );

    if let Some(max) = options.max_blocks_info_size {
        if header.uncompressed_blocks_info_size as usize > max {
            return Err(BinaryError::corrupt(format!(
                "uncompressed blocks-info size {} exceeds configured limit {}",
                header.uncompressed_blocks_info_size, max
            )));
        }
    }

    reader.set_position(header.blocks_info_offset())?;
    let compression = header.compression_type()?;
    let blocks_info_bytes = reader.read_bytes(header.compressed_blocks_info_size as usize)?;
    let blocks_info_plain = if compression == CompressionType::None {
        if header.compressed_blocks_info_size != header.uncompressed_blocks_info_size {
            return Err(BinaryError::corrupt(
                "blocks-info declared uncompressed but sizes differ",
            ));
        }
        blocks_info_bytes
    } else {
        decompress(
            &blocks_info_bytes,
            compression,
            header.uncompressed_blocks_info_size as usize,
        )?
    };

    let mut blocks_info_reader = BinaryReader::new(&blocks_info_plain, ByteOrder::Big);
    let blocks_info = BlocksInfo::parse(&mut blocks_info_reader)?;
    let nodes = if header.has_blocks_and_directory_info_combined() {
        parse_directory(&mut blocks_info_reader)?
    } else {
        Vec::new()
    };

    let total_uncompressed: u64 = blocks_info
        .blocks
        .iter()
        .map(|b| b.uncompressed_size as u64)
        .sum();

    if let Some(max) = options.max_memory {
        if total_uncompressed as usize > max {
            return Err(BinaryError::corrupt(format!(
                "decompressed data section size {} exceeds configured memory ceiling {}",
                total_uncompressed, max
            )));
        }
    }

    let buffer = if options.decompress_blocks {
        reader.set_position(header.data_offset())?;
        let mut buffer = Vec::with_capacity(total_uncompressed as usize);
        for block in &blocks_info.blocks {
            let compressed = reader.read_bytes(block.compressed_size as usize)?;
            let plain = block.decompress(&compressed)?;
            if options.validate && plain.len() != block.uncompressed_size as usize {
                return Err(BinaryError::corrupt(
                    "storage block decompressed to the wrong size",
                ));
            }
            buffer.extend_from_slice(&plain);
        }

        if options.validate {
            if header.has_blocks_info_at_the_end() {
                if reader.position() != header.blocks_info_offset() {
                    return Err(BinaryError::corrupt(
                        "data blocks did not end where the blocks-info table begins",
                    ));
                }
            } else if reader.position() != data.len() as u64 {
                return Err(BinaryError::corrupt(
                    "data blocks did not consume the whole archive",
                ));
            }
        }
        buffer
    } else {
        debug!("decompress_blocks disabled, returning directory listing only");
        Vec::new()
    };

    Ok(AssetBundle {
        header,
        nodes,
        data: buffer,
    })
}

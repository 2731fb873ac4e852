//! Directory and blocks-info tables read from the archive's blocks-info
//! section.

use crate::compression::CompressionBlock;
use crate::reader::BinaryReader;
use crate::error::Result;

/// Bits of `DirectoryNode::flags`.
pub struct NodeFlags;

impl NodeFlags {
    pub const DIRECTORY: u32 = 0x1;
    pub const DELETED: u32 = 0x2;
    pub const SERIALIZED_FILE: u32 = 0x4;
}

/// One entry in the archive's directory table: a named file backed by a
/// byte range of the decompressed data section.
#[derive(Debug, Clone)]
pub struct DirectoryNode {
    pub offset: u64,
    pub size: u64,
    pub flags: u32,
    pub path: String,
    pub index: i32,
}

impl DirectoryNode {
    pub fn parse(reader: &mut BinaryReader, index: i32) -> Result<Self> {
        let offset = reader.read_u64()?;
        let size = reader.read_u64()?;
        let flags = reader.read_u32()?;
        let path = reader.read_cstring()?;
        Ok(Self {
            offset,
            size,
            flags,
            path,
            index,
        })
    }

    pub fn is_directory(&self) -> bool {
        self.flags & NodeFlags::DIRECTORY != 0
    }

    pub fn is_serialized_file(&self) -> bool {
        self.flags & NodeFlags::SERIALIZED_FILE != 0
    }
}

/// The blocks-info table: a content hash followed by the per-block
/// compression descriptors, and (when `BlocksAndDirectoryInfoCombined` is
/// set) the directory table right after it.
#[derive(Debug, Clone)]
pub struct BlocksInfo {
    pub uncompressed_data_hash: [u8; 16],
    pub blocks: Vec<CompressionBlock>,
}

impl BlocksInfo {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        let hash_bytes = reader.read_bytes(16)?;
        let mut uncompressed_data_hash = [0u8; 16];
        uncompressed_data_hash.copy_from_slice(&hash_bytes);

        let block_count = reader.read_u32()?;
        let mut blocks = Vec::with_capacity(block_count as usize);
        for _ in 0..block_count {
            let uncompressed_size = reader.read_u32()?;
            let compressed_size = reader.read_u32()?;
            let flags = reader.read_u16()?;
            blocks.push(CompressionBlock::new(uncompressed_size, compressed_size, flags));
        }
        Ok(Self {
            uncompressed_data_hash,
            blocks,
        })
    }
}

pub fn parse_directory(reader: &mut BinaryReader) -> Result<Vec<DirectoryNode>> {
    let count = reader.read_u32()?;
    let mut nodes = Vec::with_capacity(count as usize);
    for index in 0..count as i32 {
        nodes.push(DirectoryNode::parse(reader, index)?);
    }
    Ok(nodes)
}

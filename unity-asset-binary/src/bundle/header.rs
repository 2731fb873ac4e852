//! UnityFS archive header.

use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;
use crate::compression::CompressionType;

/// Bits of `ArchiveHeader::flags`.
pub struct ArchiveFlags;

impl ArchiveFlags {
    pub const COMPRESSION_TYPE_MASK: u32 = 0x3F;
    pub const BLOCKS_AND_DIRECTORY_INFO_COMBINED: u32 = 1 << 6;
    pub const BLOCKS_INFO_AT_THE_END: u32 = 1 << 7;
    pub const OLD_WEB_PLUGIN_COMPATIBILITY: u32 = 1 << 8;
}

/// The fixed-layout header at the start of a `UnityFS` archive.
#[derive(Debug, Clone)]
pub struct ArchiveHeader {
    pub signature: String,
    pub version: i32,
    pub unity_web_bundle_version: String,
    pub unity_web_minimum_revision: String,
    pub size: u64,
    pub compressed_blocks_info_size: u32,
    pub uncompressed_blocks_info_size: u32,
    pub flags: u32,
    /// Byte length of everything read by `parse`, used to locate the
    /// blocks-info table and the data section when neither is at the end.
    pub header_size: u64,
}

impl ArchiveHeader {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        let start = reader.position();
        let signature = reader.read_cstring()?;
        if signature != "UnityFS" && signature != "UnityWeb" && signature != "UnityRaw" {
            return Err(BinaryError::format(format!(
                "unsupported archive signature: {signature}"
            )));
        }
        let version = reader.read_i32()?;
        if version == 5 {
            return Err(BinaryError::format(
                "archive format version 5 is not supported",
            ));
        }
        let unity_web_bundle_version = reader.read_cstring()?;
        let unity_web_minimum_revision = reader.read_cstring()?;
        let size = reader.read_u64()?;
        let compressed_blocks_info_size = reader.read_u32()?;
        let uncompressed_blocks_info_size = reader.read_u32()?;
        // Compression never expands the table; an uncompressed table has
        // compressed == uncompressed.
        if compressed_blocks_info_size > uncompressed_blocks_info_size {
            return Err(BinaryError::corrupt(
                "compressed blocks-info size exceeds the uncompressed size",
            ));
        }
        let flags = reader.read_u32()?;
        let header_size = reader.position() - start;

        Ok(Self {
            signature,
            version,
            unity_web_bundle_version,
            unity_web_minimum_revision,
            size,
            compressed_blocks_info_size,
            uncompressed_blocks_info_size,
            flags,
            header_size,
        })
    }

    pub fn compression_type(&self) -> Result<CompressionType> {
        CompressionType::from_flags(self.flags & ArchiveFlags::COMPRESSION_TYPE_MASK)
    }

    pub fn has_blocks_info_at_the_end(&self) -> bool {
        self.flags & ArchiveFlags::BLOCKS_INFO_AT_THE_END != 0
    }

    pub fn has_blocks_and_directory_info_combined(&self) -> bool {
        self.flags & ArchiveFlags::BLOCKS_AND_DIRECTORY_INFO_COMBINED != 0
    }

    /// Offset of the blocks-info table: at the tail of the file when
    /// `BlocksInfoAtTheEnd` is set; a fixed offset for the legacy
    /// `UnityWeb`/`UnityRaw` signatures; otherwise immediately after this
    /// header.
    pub fn blocks_info_offset(&self) -> u64 {
        if self.has_blocks_info_at_the_end() {
            if self.size == 0 {
                u64::MAX
            } else {
                self.size - self.compressed_blocks_info_size as u64
            }
        } else if self.signature == "UnityWeb" || self.signature == "UnityRaw" {
            9
        } else {
            self.header_size
        }
    }

    /// Offset of the first storage block's compressed payload. This is
    /// always right after the header: when the blocks-info table sits
    /// inline it still precedes the data section, but the blocks-info
    /// bytes were already consumed by the time the caller reads block
    /// payloads, so the data section itself always starts at
    /// `header_size` once `BlocksInfoAtTheEnd` is honored correctly.
    pub fn data_offset(&self) -> u64 {
        if self.has_blocks_info_at_the_end() {
            self.header_size
        } else {
            self.blocks_info_offset() + self.compressed_blocks_info_size as u64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteOrder;

    fn build_header(flags: u32) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"UnityFS\0");
        buf.extend_from_slice(&7i32.to_be_bytes());
        buf.extend_from_slice(b"5.x.x\0");
        buf.extend_from_slice(b"5.x.x\0");
        buf.extend_from_slice(&1000u64.to_be_bytes());
        buf.extend_from_slice(&50u32.to_be_bytes());
        buf.extend_from_slice(&120u32.to_be_bytes());
        buf.extend_from_slice(&flags.to_be_bytes());
        buf
    }

    #[test]
    fn parses_fields_big_endian() {
        let data = build_header(ArchiveFlags::BLOCKS_AND_DIRECTORY_INFO_COMBINED);
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let header = ArchiveHeader::parse(&mut reader).unwrap();
        assert_eq!(header.signature, "UnityFS");
        assert_eq!(header.version, 7);
        assert_eq!(header.size, 1000);
        assert!(header.has_blocks_and_directory_info_combined());
        assert!(!header.has_blocks_info_at_the_end());
    }

    #[test]
    fn blocks_info_offset_honors_at_the_end_flag() {
        let data = build_header(ArchiveFlags::BLOCKS_INFO_AT_THE_END);
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        let header = ArchiveHeader::parse(&mut reader).unwrap();
        assert_eq!(header.blocks_info_offset(), 1000 - 50);
        assert_eq!(header.data_offset(), header.header_size);
    }

    #[test]
    fn rejects_bad_signature() {
        let mut data = build_header(0);
        data[0] = b'X';
        let mut reader = BinaryReader::new(&data, ByteOrder::Big);
        assert!(ArchiveHeader::parse(&mut reader).is_err());
    }
}

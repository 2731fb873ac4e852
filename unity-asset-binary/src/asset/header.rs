//! The fixed, non-version-adaptive header at the start of a serialized
//! file. Every field is read in whatever byte order the reader already
//! has (big-endian, inherited from the archive); only `endianess` picks
//! the order for everything that follows.

use crate::error::Result;
use crate::reader::BinaryReader;

#[derive(Debug, Clone)]
pub struct SerializedFileHeader {
    pub metadata_size: i32,
    pub file_size: i32,
    pub version: i32,
    pub data_offset: i32,
    pub endianess: bool,
}

impl SerializedFileHeader {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        let metadata_size = reader.read_i32()?;
        let file_size = reader.read_i32()?;
        let version = reader.read_i32()?;
        let data_offset = reader.read_i32()?;
        let endianess = reader.read_bool()?;
        reader.read_bytes(3)?; // reserved

        Ok(Self {
            metadata_size,
            file_size,
            version,
            data_offset,
            endianess,
        })
    }
}

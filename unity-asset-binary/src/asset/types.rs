//! Object, script-type, and external-reference table entries.

use crate::error::Result;
use crate::reader::BinaryReader;

/// One entry of the object table: where an object's serialized bytes
/// live and which type tree decodes it.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    pub local_identifier_in_file: i64,
    pub byte_start: u32,
    pub byte_size: u32,
    pub type_id: u32,
}

impl ObjectInfo {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        Ok(Self {
            local_identifier_in_file: reader.read_i64()?,
            byte_start: reader.read_u32()?,
            byte_size: reader.read_u32()?,
            type_id: reader.read_u32()?,
        })
    }
}

/// One entry of the script-type table, pairing a local object with the
/// serialized file that defines its script (for cross-file MonoScript
/// references).
#[derive(Debug, Clone)]
pub struct ScriptTypeInfo {
    pub local_serialized_file_index: i32,
    pub local_identifier_in_file: i64,
}

impl ScriptTypeInfo {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        let local_serialized_file_index = reader.read_i32()?;
        reader.align()?;
        let local_identifier_in_file = reader.read_i64()?;
        Ok(Self {
            local_serialized_file_index,
            local_identifier_in_file,
        })
    }
}

/// One entry of the external-reference table: another serialized file
/// this one points into.
#[derive(Debug, Clone)]
pub struct ExternalInfo {
    pub guid: [u8; 16],
    pub external_type: i32,
    pub path: String,
}

impl ExternalInfo {
    pub fn parse(reader: &mut BinaryReader) -> Result<Self> {
        // Legacy placeholder string, always empty in modern files.
        reader.read_cstring()?;
        let guid_bytes = reader.read_bytes(16)?;
        let mut guid = [0u8; 16];
        guid.copy_from_slice(&guid_bytes);
        let external_type = reader.read_i32()?;
        let path = reader.read_cstring()?;
        Ok(Self {
            guid,
            external_type,
            path,
        })
    }
}

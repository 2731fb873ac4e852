//! Serialized-file parse pipeline: header, type-tree table, object
//! table, script-type table, external-reference table.

use tracing::{debug, warn};

use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};
use crate::typetree::{parse_type_tree, register_type_tree};

use super::header::SerializedFileHeader;
use super::types::{ExternalInfo, ObjectInfo, ScriptTypeInfo};
use super::{cache, SerializedFile, SerializedFileOptions};

pub fn parse(reader: &mut BinaryReader, options: &SerializedFileOptions) -> Result<SerializedFile> {
    let header = SerializedFileHeader::parse(reader)?;
    if header.file_size < 0 || header.file_size as usize != reader.len() {
        return Err(BinaryError::corrupt(format!(
            "file_size {} does not match the {}-byte buffer handed to parse",
            header.file_size,
            reader.len()
        )));
    }
    reader.set_byte_order(if header.endianess {
        ByteOrder::Big
    } else {
        ByteOrder::Little
    });

    let unity_version = reader.read_cstring()?;
    let platform = reader.read_u32()?;
    let type_tree_enabled = reader.read_bool()?;
    debug!(
        unity_version = %unity_version,
        platform,
        type_tree_enabled,
        "parsed serialized file header"
    );

    let type_count = reader.read_u32()?;
    let mut type_trees = Vec::with_capacity(type_count as usize);
    for _ in 0..type_count {
        let tree_start = reader.position() as usize;
        let mut tree = parse_type_tree(reader, type_tree_enabled)?;
        register_type_tree(&mut tree);

        if type_tree_enabled && options.populate_type_cache {
            if let Some(dir) = &options.cache_dir {
                let tree_end = reader.position() as usize;
                let bytes = reader.slice(tree_start, tree_end);
                let key = (tree.persistent_type_id, tree.type_hash);
                if let Err(err) = cache::store(dir, key, bytes) {
                    warn!(error = %err, "failed to write type-tree cache entry");
                }
            }
        }

        type_trees.push(tree);
    }

    let object_count = reader.read_i32()?;
    let mut objects = Vec::with_capacity(object_count.max(0) as usize);
    for _ in 0..object_count {
        reader.align()?;
        objects.push(ObjectInfo::parse(reader)?);
    }

    let script_type_count = reader.read_i32()?;
    let mut script_types = Vec::with_capacity(script_type_count.max(0) as usize);
    for _ in 0..script_type_count {
        script_types.push(ScriptTypeInfo::parse(reader)?);
    }

    let external_count = reader.read_i32()?;
    let mut externals = Vec::with_capacity(external_count.max(0) as usize);
    for _ in 0..external_count {
        externals.push(ExternalInfo::parse(reader)?);
    }

    // Trailing marker present in every observed file; content unused.
    reader.read_cstring()?;

    Ok(SerializedFile {
        header,
        unity_version,
        platform,
        type_tree_enabled,
        type_trees,
        objects,
        script_types,
        externals,
    })
}

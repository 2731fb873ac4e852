//! Decodes a type tree's flat node list and per-tree string buffer off
//! the wire.

use std::collections::HashMap;

use unity_asset_core::MONO_BEHAVIOUR_PERSISTENT_ID;

use crate::error::{BinaryError, Result};
use crate::reader::BinaryReader;

use super::strings;
use super::types::{TypeField, TypeTree};

impl TypeField {
    fn parse(reader: &mut BinaryReader) -> Result<Self> {
        let version = reader.read_i16()?;
        let level = reader.read_u8()?;
        let is_array = reader.read_bool()?;
        let type_str_offset = reader.read_u32()?;
        let name_str_offset = reader.read_u32()?;
        let byte_size = reader.read_i32()?;
        let index = reader.read_i32()?;
        let meta_flag = reader.read_u32()?;
        Ok(Self {
            version,
            level,
            is_array,
            type_str_offset,
            name_str_offset,
            byte_size,
            index,
            meta_flag,
            type_name: String::new(),
            field_name: String::new(),
        })
    }
}

/// Parse one type tree. `class_views` is left empty; call
/// [`super::builder::register_type_tree`] on the result to populate it.
pub fn parse_type_tree(reader: &mut BinaryReader, type_tree_enabled: bool) -> Result<TypeTree> {
    let persistent_type_id = reader.read_i32()?;
    let is_stripped_type = reader.read_bool()?;
    let script_type_index = reader.read_i16()?;

    let script_type_hash = if persistent_type_id == MONO_BEHAVIOUR_PERSISTENT_ID {
        let bytes = reader.read_bytes(16)?;
        let mut hash = [0u8; 16];
        hash.copy_from_slice(&bytes);
        Some(hash)
    } else {
        None
    };

    let type_hash_bytes = reader.read_bytes(16)?;
    let mut type_hash = [0u8; 16];
    type_hash.copy_from_slice(&type_hash_bytes);

    let mut nodes = Vec::new();
    if type_tree_enabled {
        let node_count = reader.read_u32()?;
        let char_count = reader.read_u32()?;
        let mut previous_index: Option<i32> = None;
        for _ in 0..node_count {
            let node = TypeField::parse(reader)?;
            if let Some(prev) = previous_index {
                if node.index != prev + 1 {
                    return Err(BinaryError::corrupt(format!(
                        "type-tree node index {} out of sequence, expected {}",
                        node.index,
                        prev + 1
                    )));
                }
            }
            previous_index = Some(node.index);
            nodes.push(node);
        }

        let mut local_strings = HashMap::new();
        if char_count > 0 {
            let string_offset = reader.position();
            let mut consumed = 0u32;
            while consumed + 1 < char_count {
                let offset = (reader.position() - string_offset) as u32;
                let s = reader.read_cstring()?;
                consumed += s.len() as u32 + 1;
                local_strings.insert(offset, s);
            }
        }

        for node in &mut nodes {
            node.type_name = strings::resolve(node.type_str_offset, &local_strings);
            node.field_name = strings::resolve(node.name_str_offset, &local_strings);
        }
    }

    Ok(TypeTree {
        persistent_type_id,
        is_stripped_type,
        script_type_index,
        script_type_hash,
        type_hash,
        nodes,
        class_views: indexmap::IndexMap::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ByteOrder;

    #[test]
    fn parses_empty_tree_when_disabled() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_be_bytes()); // persistent_type_id
        buf.push(0); // is_stripped_type
        buf.extend_from_slice(&0i16.to_be_bytes()); // script_type_index
        buf.extend_from_slice(&[0u8; 16]); // type_hash
        let mut reader = BinaryReader::new(&buf, ByteOrder::Big);
        let tree = parse_type_tree(&mut reader, false).unwrap();
        assert_eq!(tree.persistent_type_id, 1);
        assert!(tree.nodes.is_empty());
    }

    #[test]
    fn rejects_out_of_sequence_node_index() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&1i32.to_be_bytes()); // persistent_type_id
        buf.push(0); // is_stripped_type
        buf.extend_from_slice(&0i16.to_be_bytes()); // script_type_index
        buf.extend_from_slice(&[0u8; 16]); // type_hash
        buf.extend_from_slice(&2u32.to_be_bytes()); // node_count
        buf.extend_from_slice(&0u32.to_be_bytes()); // char_count
        // Node 0: index 0 (fine).
        buf.extend_from_slice(&1i16.to_be_bytes());
        buf.push(0);
        buf.push(0);
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&(-1i32).to_be_bytes());
        buf.extend_from_slice(&0i32.to_be_bytes()); // index
        buf.extend_from_slice(&0u32.to_be_bytes());
        // Node 1: index jumps to 5 instead of 1.
        buf.extend_from_slice(&1i16.to_be_bytes());
        buf.push(1);
        buf.push(0);
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&0u32.to_be_bytes());
        buf.extend_from_slice(&4i32.to_be_bytes());
        buf.extend_from_slice(&5i32.to_be_bytes()); // index
        buf.extend_from_slice(&0u32.to_be_bytes());

        let mut reader = BinaryReader::new(&buf, ByteOrder::Big);
        let err = parse_type_tree(&mut reader, true).unwrap_err();
        assert!(matches!(err, BinaryError::CorruptArchive(_)));
    }

    #[test]
    fn mono_behaviour_carries_script_hash() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MONO_BEHAVIOUR_PERSISTENT_ID.to_be_bytes());
        buf.push(0);
        buf.extend_from_slice(&0i16.to_be_bytes());
        buf.extend_from_slice(&[7u8; 16]); // script_type_hash
        buf.extend_from_slice(&[0u8; 16]); // type_hash
        buf.extend_from_slice(&0u32.to_be_bytes()); // node_count
        buf.extend_from_slice(&0u32.to_be_bytes()); // char_count
        let mut reader = BinaryReader::new(&buf, ByteOrder::Big);
        let tree = parse_type_tree(&mut reader, true).unwrap();
        assert_eq!(tree.script_type_hash, Some([7u8; 16]));
    }
}

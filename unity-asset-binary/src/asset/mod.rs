//! Serialized files: the type-tree-described object container found
//! inside an archive (or, for legacy content, standing alone on disk).

pub mod cache;
pub mod header;
pub mod parser;
pub mod types;

pub use header::SerializedFileHeader;
pub use types::{ExternalInfo, ObjectInfo, ScriptTypeInfo};

use std::collections::HashMap;
use std::path::PathBuf;

use tracing::warn;
use unity_asset_core::Value;

use crate::error::{BinaryError, Result};
use crate::reader::{BinaryReader, ByteOrder};
use crate::typetree::TypeTree;

/// A cache key for an external type-tree lookup: the class and the
/// exact type-tree revision it was generated against.
pub type TypeTreeCacheKey = (i32, [u8; 16]);

/// Tunables for decoding a serialized file: whether to enforce strict
/// post-conditions, and how to fall back for classes whose own file
/// carries no type tree (`type_tree_enabled == false`).
#[derive(Debug, Clone)]
pub struct SerializedFileOptions {
    /// Type trees already in hand, keyed by `(persistent_type_id, type_hash)`,
    /// consulted before the on-disk cache.
    pub type_tree_cache: HashMap<TypeTreeCacheKey, TypeTree>,
    /// Directory holding `<persistent_type_id>_<hex(type_hash)>.type`
    /// cache files. `None` disables the on-disk fallback entirely.
    pub cache_dir: Option<PathBuf>,
    /// Write every type tree parsed with `type_tree_enabled == true` to
    /// `cache_dir`, so later files missing their own tree can reuse it.
    pub populate_type_cache: bool,
    /// Enforce the format's strict post-conditions (object byte-range
    /// bounds, the post-decode stream-position check) as hard errors
    /// rather than logging and skipping the affected object.
    pub validate: bool,
}

impl Default for SerializedFileOptions {
    fn default() -> Self {
        Self {
            type_tree_cache: HashMap::new(),
            cache_dir: None,
            populate_type_cache: false,
            validate: true,
        }
    }
}

impl SerializedFileOptions {
    /// Minimal processing: no cache population, best-effort validation.
    pub fn fast() -> Self {
        Self {
            type_tree_cache: HashMap::new(),
            cache_dir: None,
            populate_type_cache: false,
            validate: false,
        }
    }

    /// Full processing: populate the on-disk cache under `.unity-type-cache`
    /// in the current directory and enforce every post-condition strictly.
    pub fn complete() -> Self {
        Self {
            type_tree_cache: HashMap::new(),
            cache_dir: Some(PathBuf::from(".unity-type-cache")),
            populate_type_cache: true,
            validate: true,
        }
    }
}

/// A parsed serialized file: its header, the type trees describing
/// every class it contains, and the object/script/external tables.
#[derive(Debug, Clone)]
pub struct SerializedFile {
    pub header: SerializedFileHeader,
    pub unity_version: String,
    pub platform: u32,
    pub type_tree_enabled: bool,
    pub type_trees: Vec<TypeTree>,
    pub objects: Vec<ObjectInfo>,
    pub script_types: Vec<ScriptTypeInfo>,
    pub externals: Vec<ExternalInfo>,
}

impl SerializedFile {
    pub fn parse(data: &[u8]) -> Result<Self> {
        Self::parse_with_options(data, &SerializedFileOptions::default())
    }

    pub fn parse_with_options(data: &[u8], options: &SerializedFileOptions) -> Result<Self> {
        let mut reader = BinaryReader::new(data, ByteOrder::Big);
        parser::parse(&mut reader, options)
    }

    fn resolve_tree<'a>(
        &'a self,
        obj: &ObjectInfo,
        options: &'a SerializedFileOptions,
    ) -> Result<std::borrow::Cow<'a, TypeTree>> {
        let tree = self
            .type_trees
            .get(obj.type_id as usize)
            .ok_or(BinaryError::UnknownType(obj.type_id as i32))?;

        if tree.root().is_some() {
            return Ok(std::borrow::Cow::Borrowed(tree));
        }

        let key = (tree.persistent_type_id, tree.type_hash);

        if let Some(cached) = options.type_tree_cache.get(&key).filter(|t| t.root().is_some()) {
            return Ok(std::borrow::Cow::Borrowed(cached));
        }

        if let Some(dir) = &options.cache_dir {
            let byte_order = if self.header.endianess {
                ByteOrder::Big
            } else {
                ByteOrder::Little
            };
            if let Some(from_disk) = cache::load(dir, key, byte_order) {
                return Ok(std::borrow::Cow::Owned(from_disk));
            }
        }

        warn!(
            persistent_type_id = tree.persistent_type_id,
            "no type tree available, object will be skipped"
        );
        Err(BinaryError::MissingTypeTree {
            persistent_type_id: tree.persistent_type_id,
        })
    }

    /// Deserialize one object's body. The reader must already be over
    /// this file's raw bytes (as produced by `Self::parse`'s input
    /// slice); `full_data` backs the `BinaryReader` this call creates.
    pub fn deserialize_object(
        &self,
        full_data: &[u8],
        obj: &ObjectInfo,
        options: &SerializedFileOptions,
    ) -> Result<Value> {
        let tree = self.resolve_tree(obj, options)?;
        let view = tree
            .root()
            .ok_or(BinaryError::MissingTypeTree {
                persistent_type_id: tree.persistent_type_id,
            })?;

        let data_region_size =
            (self.header.file_size as i64 - self.header.data_offset as i64).max(0) as u64;
        let object_end = obj.byte_start as u64 + obj.byte_size as u64;
        if object_end > data_region_size {
            return Err(BinaryError::corrupt(format!(
                "object byte range {}..{} exceeds data region size {}",
                obj.byte_start, object_end, data_region_size
            )));
        }

        let byte_order = if self.header.endianess {
            ByteOrder::Big
        } else {
            ByteOrder::Little
        };
        let start = self.header.data_offset as u64 + obj.byte_start as u64;
        let end = start + obj.byte_size as u64;
        let mut reader = BinaryReader::new(full_data, byte_order);
        reader.set_position(start)?;

        let value = crate::typetree::deserialize(&mut reader, &tree, view)?;

        if reader.position() != end {
            let err = BinaryError::DecodeDesync {
                object_start: start,
                expected_end: end,
                actual: reader.position(),
            };
            if options.validate {
                return Err(err);
            }
            warn!(error = %err, "ignoring decode desync");
        }

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::typetree::{register_type_tree, TypeField};

    fn sample_tree() -> TypeTree {
        let mut tree = TypeTree {
            persistent_type_id: 1,
            is_stripped_type: false,
            script_type_index: -1,
            script_type_hash: None,
            type_hash: [0; 16],
            nodes: vec![
                TypeField {
                    version: 1,
                    level: 0,
                    is_array: false,
                    type_str_offset: 0,
                    name_str_offset: 0,
                    byte_size: -1,
                    index: 0,
                    meta_flag: 0,
                    type_name: "Base".to_string(),
                    field_name: "Base".to_string(),
                },
                TypeField {
                    version: 1,
                    level: 1,
                    is_array: false,
                    type_str_offset: 0,
                    name_str_offset: 0,
                    byte_size: 4,
                    index: 1,
                    meta_flag: 0,
                    type_name: "int".to_string(),
                    field_name: "x".to_string(),
                },
            ],
            class_views: indexmap::IndexMap::new(),
        };
        register_type_tree(&mut tree);
        tree
    }

    fn sample_file(file_size: i32, data_offset: i32) -> SerializedFile {
        SerializedFile {
            header: SerializedFileHeader {
                metadata_size: 0,
                file_size,
                version: 21,
                data_offset,
                endianess: true,
            },
            unity_version: "2021.x".to_string(),
            platform: 0,
            type_tree_enabled: true,
            type_trees: vec![sample_tree()],
            objects: vec![],
            script_types: vec![],
            externals: vec![],
        }
    }

    #[test]
    fn rejects_object_byte_range_past_data_region() {
        let file = sample_file(20, 16); // data region size = 4
        let obj = ObjectInfo {
            local_identifier_in_file: 1,
            byte_start: 0,
            byte_size: 8,
            type_id: 0,
        };
        let full_data = vec![0u8; 20];
        let options = SerializedFileOptions::default();
        let err = file.deserialize_object(&full_data, &obj, &options).unwrap_err();
        assert!(matches!(err, BinaryError::CorruptArchive(_)));
    }

    #[test]
    fn decodes_object_within_bounds() {
        let file = sample_file(20, 16); // data region size = 4
        let obj = ObjectInfo {
            local_identifier_in_file: 1,
            byte_start: 0,
            byte_size: 4,
            type_id: 0,
        };
        let mut full_data = vec![0u8; 16];
        full_data.extend_from_slice(&42i32.to_be_bytes());
        let options = SerializedFileOptions::default();
        let value = file.deserialize_object(&full_data, &obj, &options).unwrap();
        assert_eq!(value.get("x"), Some(&Value::I32(42)));
    }

    #[test]
    fn resolve_tree_falls_back_to_disk_cache() {
        let mut file = sample_file(20, 16);
        // Strip the inline tree to force the cache fallback path.
        file.type_trees[0].class_views.clear();

        let dir = tempfile::tempdir().unwrap();
        let mut tree_bytes = Vec::new();
        tree_bytes.extend_from_slice(&1i32.to_be_bytes()); // persistent_type_id
        tree_bytes.push(0); // is_stripped_type
        tree_bytes.extend_from_slice(&0i16.to_be_bytes()); // script_type_index
        tree_bytes.extend_from_slice(&[0u8; 16]); // type_hash
        tree_bytes.extend_from_slice(&2u32.to_be_bytes()); // node_count
        tree_bytes.extend_from_slice(&6u32.to_be_bytes()); // char_count ("int\0x\0")
        // Node 0: root/"Base", not itself decoded.
        tree_bytes.extend_from_slice(&1i16.to_be_bytes());
        tree_bytes.push(0); // level
        tree_bytes.push(0); // is_array
        tree_bytes.extend_from_slice(&0u32.to_be_bytes()); // type_str_offset
        tree_bytes.extend_from_slice(&0u32.to_be_bytes()); // name_str_offset
        tree_bytes.extend_from_slice(&(-1i32).to_be_bytes()); // byte_size
        tree_bytes.extend_from_slice(&0i32.to_be_bytes()); // index
        tree_bytes.extend_from_slice(&0u32.to_be_bytes()); // meta_flag
        // Node 1: the one field this class carries, `x: int`.
        tree_bytes.extend_from_slice(&1i16.to_be_bytes());
        tree_bytes.push(1); // level
        tree_bytes.push(0); // is_array
        tree_bytes.extend_from_slice(&0u32.to_be_bytes()); // type_str_offset -> "int"
        tree_bytes.extend_from_slice(&4u32.to_be_bytes()); // name_str_offset -> "x"
        tree_bytes.extend_from_slice(&4i32.to_be_bytes()); // byte_size
        tree_bytes.extend_from_slice(&1i32.to_be_bytes()); // index
        tree_bytes.extend_from_slice(&0u32.to_be_bytes()); // meta_flag
        tree_bytes.extend_from_slice(b"int\0x\0"); // per-tree string buffer
        cache::store(dir.path(), (1, [0u8; 16]), &tree_bytes).unwrap();

        let options = SerializedFileOptions {
            cache_dir: Some(dir.path().to_path_buf()),
            ..SerializedFileOptions::default()
        };
        let obj = ObjectInfo {
            local_identifier_in_file: 1,
            byte_start: 0,
            byte_size: 4,
            type_id: 0,
        };
        let mut full_data = vec![0u8; 16];
        full_data.extend_from_slice(&7i32.to_be_bytes());
        let value = file.deserialize_object(&full_data, &obj, &options).unwrap();
        assert_eq!(value.get("x"), Some(&Value::I32(7)));
    }
}

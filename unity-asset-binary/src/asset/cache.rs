//! External, file-backed type-tree cache. Each cached tree is stored as
//! the verbatim byte range consumed while decoding it inline, named
//! `<persistent_type_id>_<hex(type_hash)>.type`, so reading it back is
//! just re-running the ordinary type-tree decoder over those bytes.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::reader::{BinaryReader, ByteOrder};
use crate::typetree::{parse_type_tree, register_type_tree, TypeTree};

use super::TypeTreeCacheKey;

fn entry_path(dir: &Path, key: TypeTreeCacheKey) -> PathBuf {
    let (persistent_type_id, type_hash) = key;
    dir.join(format!("{persistent_type_id}_{}.type", hex::encode(type_hash)))
}

/// Write `bytes` to `dir`, keyed by `key`. Atomic: writes to a `.tmp`
/// sibling first, then renames it over the final name, so concurrent
/// readers never observe a partial file.
pub fn store(dir: &Path, key: TypeTreeCacheKey, bytes: &[u8]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let final_path = entry_path(dir, key);
    let tmp_path = final_path.with_extension("type.tmp");
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, &final_path)?;
    debug!(path = %final_path.display(), "wrote type-tree cache entry");
    Ok(())
}

/// Read back a previously cached tree for `key`, re-parsing its bytes
/// exactly as they were consumed inline (`type_tree_enabled = true`).
/// Returns `None` on any miss or decode failure; the caller falls back
/// to `MissingTypeTree`.
pub fn load(dir: &Path, key: TypeTreeCacheKey, byte_order: ByteOrder) -> Option<TypeTree> {
    let path = entry_path(dir, key);
    let bytes = fs::read(&path).ok()?;
    let mut reader = BinaryReader::new(&bytes, byte_order);
    let mut tree = parse_type_tree(&mut reader, true).ok()?;
    register_type_tree(&mut tree);
    if (tree.persistent_type_id, tree.type_hash) != key {
        warn!(path = %path.display(), "type-tree cache entry key mismatch, ignoring");
        return None;
    }
    Some(tree)
}

//! `UnityFS` archive reading: header, blocks-info, storage blocks, and the
//! directory of serialized files and resources they contain.

pub mod header;
pub mod parser;
pub mod types;

pub use header::{ArchiveFlags, ArchiveHeader};
pub use types::{BlocksInfo, DirectoryNode, NodeFlags};

use crate::error::Result;

/// Tunables for opening an archive.
#[derive(Debug, Clone)]
pub struct BundleLoadOptions {
    /// Reject archives whose blocks-info table claims to decompress past
    /// this many bytes. `None` means no limit.
    pub max_blocks_info_size: Option<usize>,
    /// Eagerly decompress every storage block during `parse` rather than
    /// lazily on first access.
    pub decompress_blocks: bool,
    /// Enforce the format's strict post-conditions (directory nodes
    /// within bounds, blocks-info size relations) as hard errors rather
    /// than logging and continuing.
    pub validate: bool,
    /// Ceiling on the total decompressed data-section size. `None` means
    /// no limit.
    pub max_memory: Option<usize>,
}

impl Default for BundleLoadOptions {
    fn default() -> Self {
        Self {
            max_blocks_info_size: None,
            decompress_blocks: true,
            validate: true,
            max_memory: None,
        }
    }
}

impl BundleLoadOptions {
    /// Minimal processing: skip eager decompression and best-effort
    /// validation, for callers that only need the directory listing.
    pub fn fast() -> Self {
        Self {
            max_blocks_info_size: None,
            decompress_blocks: false,
            validate: false,
            max_memory: None,
        }
    }

    /// Full processing with a generous memory ceiling.
    pub fn complete() -> Self {
        Self {
            max_blocks_info_size: Some(1024 * 1024 * 1024),
            decompress_blocks: true,
            validate: true,
            max_memory: Some(2 * 1024 * 1024 * 1024),
        }
    }
}

/// A parsed `UnityFS` archive: the directory of named entries and the
/// decompressed data section backing them. `data` is empty when opened
/// with `decompress_blocks: false` (e.g. `BundleLoadOptions::fast()`) —
/// such callers get the directory listing only, not node bytes.
#[derive(Debug, Clone)]
pub struct AssetBundle {
    pub header: ArchiveHeader,
    pub nodes: Vec<DirectoryNode>,
    pub data: Vec<u8>,
}

impl AssetBundle {
    pub fn parse(data: &[u8]) -> Result<Self> {
        parser::parse(data, &BundleLoadOptions::default())
    }

    pub fn parse_with_options(data: &[u8], options: &BundleLoadOptions) -> Result<Self> {
        parser::parse(data, options)
    }

    /// The byte range of the decompressed data section backing `node`.
    /// Panics on an out-of-range slice if the bundle was opened with
    /// `decompress_blocks: false`; callers using that mode should not
    /// call this.
    pub fn node_data(&self, node: &DirectoryNode) -> &[u8] {
        let start = node.offset as usize;
        let end = start + node.size as usize;
        &self.data[start..end]
    }

    pub fn serialized_file_nodes(&self) -> impl Iterator<Item = &DirectoryNode> {
        self.nodes.iter().filter(|n| n.is_serialized_file())
    }
}

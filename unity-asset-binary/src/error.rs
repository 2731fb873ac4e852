//! Error types for Unity binary parsing.
//!
//! One enum covers every failure mode the reader can produce. Variants
//! below `MissingTypeTree` are always fatal to the decoding call in
//! progress; `MissingTypeTree` is the one kind callers are expected to
//! catch and recover from (skip the affected object, keep decoding).

use thiserror::Error;

/// Result type for Unity binary operations.
pub type Result<T> = std::result::Result<T, BinaryError>;

#[derive(Error, Debug)]
pub enum BinaryError {
    /// Signature or version mismatch on an archive or serialized-file
    /// header.
    #[error("format error: {0}")]
    FormatError(String),

    /// Fewer bytes remained than a read required.
    #[error("end of stream: expected {expected} bytes, {remaining} remaining")]
    EndOfStream { expected: usize, remaining: usize },

    /// Decompression size mismatch, residual trailing bytes, or a violated
    /// archive-level invariant.
    #[error("corrupt archive: {0}")]
    CorruptArchive(String),

    /// A composite field's type-tree index has no entry in the owning
    /// tree's class map.
    #[error("unknown type: class map has no entry for field index {0}")]
    UnknownType(i32),

    /// The stream position after deserializing an object did not match
    /// `data_offset + byte_start + byte_size`.
    #[error("decode desync: object at {object_start} expected to end at {expected_end}, stream is at {actual}")]
    DecodeDesync {
        object_start: u64,
        expected_end: u64,
        actual: u64,
    },

    /// A serialized file declared `type_tree_enabled == false` for a type
    /// with no corresponding entry in the external type-tree cache.
    /// Non-fatal: the caller skips the affected object(s).
    #[error("missing type tree for persistent type id {persistent_type_id}")]
    MissingTypeTree { persistent_type_id: i32 },

    /// I/O error from the underlying byte source (cache file access).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A decoded byte run was not valid UTF-8.
    #[error("invalid UTF-8 string: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    /// LZMA decompression failure.
    #[error("LZMA decompression failed: {0}")]
    Lzma(#[from] lzma_rs::error::Error),

    /// Decompression failure from a codec whose error type does not
    /// implement `std::error::Error` uniformly (LZ4, Brotli).
    #[error("decompression failed: {0}")]
    Decompress(String),
}

impl BinaryError {
    pub fn format<S: Into<String>>(msg: S) -> Self {
        Self::FormatError(msg.into())
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Self::CorruptArchive(msg.into())
    }

    pub fn decompress<S: Into<String>>(msg: S) -> Self {
        Self::Decompress(msg.into())
    }
}

impl From<lz4_flex::block::DecompressError> for BinaryError {
    fn from(err: lz4_flex::block::DecompressError) -> Self {
        Self::decompress(format!("LZ4: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_context() {
        let err = BinaryError::UnknownType(7);
        assert!(err.to_string().contains('7'));

        let err = BinaryError::DecodeDesync {
            object_start: 100,
            expected_end: 150,
            actual: 140,
        };
        let msg = err.to_string();
        assert!(msg.contains("100") && msg.contains("150") && msg.contains("140"));
    }

    #[test]
    fn missing_type_tree_is_distinguishable() {
        let err = BinaryError::MissingTypeTree {
            persistent_type_id: 114,
        };
        assert!(matches!(err, BinaryError::MissingTypeTree { .. }));
    }
}

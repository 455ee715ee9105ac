//! Error types for the HNK crate.

use thiserror::Error;

/// Errors that can occur when reading or writing HNK containers.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Common library error (truncated data, bad magic).
    #[error("{0}")]
    Common(#[from] hunkdisk_common::Error),

    /// Unsupported container version.
    #[error("unsupported HNK version: {0}")]
    UnsupportedVersion(u16),

    /// Header checksum mismatch.
    #[error("header checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    HeaderChecksum { stored: u32, computed: u32 },

    /// Hunk map checksum mismatch.
    #[error("hunk map checksum mismatch: stored {stored:#010x}, computed {computed:#010x}")]
    MapChecksum { stored: u32, computed: u32 },

    /// Header geometry is inconsistent.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// Unknown per-hunk codec tag.
    #[error("unsupported codec: {0}")]
    UnsupportedCodec(u8),

    /// Hunk index past the end of the hunk map.
    #[error("hunk {index} out of range ({count} hunks)")]
    HunkOutOfRange { index: u32, count: u32 },

    /// Hunk map entry points outside the file.
    #[error("hunk {index} data lies outside the file")]
    HunkOutOfBounds { index: u32 },

    /// Output buffer does not match the hunk size.
    #[error("hunk buffer is {actual} bytes, expected {expected}")]
    BufferSize { expected: usize, actual: usize },

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// Compression error.
    #[error("compression error: {0}")]
    Compression(String),
}

/// Result type for HNK operations.
pub type Result<T> = std::result::Result<T, Error>;

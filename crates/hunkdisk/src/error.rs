//! Error types for the block reader.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur when opening or reading an image.
///
/// Only open-time failures are returned to callers. Read-time failures
/// ([`HunkOutOfRange`](Error::HunkOutOfRange),
/// [`Decompression`](Error::Decompression)) are produced inside the hunk cache,
/// logged, and surfaced to readers as short byte counts.
#[derive(Debug, Error)]
pub enum Error {
    /// The container library rejected the file.
    #[error("failed to open container: {0}")]
    Container(#[from] hunkdisk_hnk::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The container opened but its header geometry is missing or unusable.
    #[error("invalid geometry: {0}")]
    InvalidGeometry(&'static str),

    /// The hunk buffer could not be allocated.
    #[error("cannot allocate a {bytes}-byte hunk buffer")]
    Allocation { bytes: usize },

    /// Hunk index past the last hunk.
    #[error("hunk {index} out of range ({count} hunks)")]
    HunkOutOfRange { index: u32, count: u32 },

    /// The container failed to decode a hunk.
    #[error("failed to decompress hunk {index}: {source}")]
    Decompression {
        index: u32,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// No reader recognizes the file.
    #[error("unrecognized image format: {}", .0.display())]
    UnknownFormat(PathBuf),
}

/// Result type for block reader operations.
pub type Result<T> = std::result::Result<T, Error>;

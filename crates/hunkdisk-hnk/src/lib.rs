//! HNK container reader and writer.
//!
//! HNK is a simple hunk-compressed image format: the logical byte stream of a
//! disc or disk image is cut into fixed-size hunks, and every hunk is
//! compressed on its own so any of them can be decoded without touching the
//! others. It supports:
//!
//! - Per-hunk codec selection: stored, DEFLATE or Zstandard
//! - Random access through a hunk map at the end of the file
//! - CRC32C-protected header and hunk map
//! - Parallel hunk compression with rayon (with `parallel` feature)
//!
//! # Example
//!
//! ```no_run
//! use hunkdisk_hnk::HnkFile;
//!
//! let file = HnkFile::open("game.hnk")?;
//! let mut hunk = vec![0u8; file.hunk_size() as usize];
//!
//! file.read_hunk(0, &mut hunk)?;
//! println!("{} hunks, {} bytes", file.hunk_count(), file.logical_size());
//! # Ok::<(), hunkdisk_hnk::Error>(())
//! ```

mod codec;
mod error;
mod file;
pub mod format;
mod writer;

pub use error::{Error, Result};
pub use file::HnkFile;
pub use format::{Codec, HnkHeader, HunkMapEntry};
pub use writer::{HnkSummary, HnkWriter, WriterOptions};

/// File extension used by HNK containers.
pub const HNK_EXTENSION: &str = "hnk";

//! Hunkdisk - sector-addressed block reader over hunk-compressed disc images.
//!
//! A caller asks for `count` sectors starting at `sector`; the reader turns
//! that into a byte range, shifts it by the configured data offset, maps it
//! onto (hunk, offset) pairs, decompresses each hunk on demand and copies the
//! requested span out.
//!
//! # Components
//!
//! - [`Geometry`] - byte index <-> (hunk, offset) translation
//! - [`ContainerAdapter`] - owns the open container and its hunk buffer
//! - [`HunkCache`] - single reusable decompressed-hunk buffer
//! - [`HunkDiskReader`] - the [`BlockReader`] over HNK containers
//! - [`FlatReader`] - the [`BlockReader`] over uncompressed images
//! - [`AnyReader`] - format detection and dispatch
//!
//! # Example
//!
//! ```no_run
//! use hunkdisk::prelude::*;
//!
//! let mut reader = AnyReader::open("game.hnk")?;
//! println!("{} sectors", reader.block_count());
//!
//! let mut buf = vec![0u8; 2048 * 4];
//! let read = reader.read_sync(&mut buf, 16, 4);
//! println!("read {read} bytes");
//! # Ok::<(), hunkdisk::Error>(())
//! ```

pub mod adapter;
mod block;
pub mod cache;
mod error;
mod flat;
mod format;
pub mod geometry;
mod reader;

pub use adapter::{ContainerAdapter, HunkSource};
pub use block::{BlockConfig, BlockReader, PendingRead, ReadHandle};
pub use cache::{HunkCache, HunkCacheStats};
pub use error::{Error, Result};
pub use flat::{FlatReader, FLAT_EXTENSIONS};
pub use format::{AnyReader, ImageFormat};
pub use geometry::{Geometry, HunkPosition};
pub use reader::HunkDiskReader;

// Re-export the container crate
pub use hunkdisk_hnk as hnk;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::{AnyReader, BlockConfig, BlockReader, HunkDiskReader, ImageFormat};
    pub use hunkdisk_hnk::{Codec, HnkFile, HnkWriter, WriterOptions};
}

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

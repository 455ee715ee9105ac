//! Block reader over a hunk-compressed container.

use std::path::Path;

use hunkdisk_hnk::HnkFile;
use tracing::trace;

use crate::adapter::{ContainerAdapter, HunkSource};
use crate::block::{BlockConfig, BlockReader, PendingRead, ReadHandle};
use crate::cache::HunkCacheStats;
use crate::{Geometry, Result};

/// Reads sectors out of a hunk-compressed container, decompressing one hunk
/// at a time.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use hunkdisk::{BlockReader, HunkDiskReader};
///
/// let mut reader: HunkDiskReader = HunkDiskReader::new();
/// reader.open(Path::new("game.hnk"))?;
///
/// let mut sector = vec![0u8; 2048];
/// let read = reader.read_sync(&mut sector, 16, 1);
/// assert_eq!(read, 2048);
/// # Ok::<(), hunkdisk::Error>(())
/// ```
pub struct HunkDiskReader<S = HnkFile> {
    container: ContainerAdapter<S>,
    config: BlockConfig,
    pending: PendingRead,
}

impl<S: HunkSource> HunkDiskReader<S> {
    /// Create a closed reader with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BlockConfig::default())
    }

    /// Create a closed reader with the given configuration.
    pub fn with_config(config: BlockConfig) -> Self {
        Self {
            container: ContainerAdapter::new(),
            config,
            pending: PendingRead::default(),
        }
    }

    /// Check whether `path` is a container this reader can open.
    pub fn probe(path: &Path) -> bool {
        ContainerAdapter::<S>::probe(path)
    }

    /// Geometry of the open container.
    pub fn geometry(&self) -> Option<Geometry> {
        self.container.geometry()
    }

    /// Path of the open container.
    pub fn path(&self) -> Option<&Path> {
        self.container.path()
    }

    /// Hunk cache counters of the open container.
    pub fn cache_stats(&self) -> Option<HunkCacheStats> {
        self.container.cache_stats()
    }

    /// The underlying container adapter.
    pub fn container(&self) -> &ContainerAdapter<S> {
        &self.container
    }
}

impl<S: HunkSource> BlockReader for HunkDiskReader<S> {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.container.open(path)
    }

    fn close(&mut self) {
        self.container.close();
    }

    fn is_open(&self) -> bool {
        self.container.is_open()
    }

    fn read_sync(&mut self, buf: &mut [u8], sector: u32, count: u32) -> usize {
        let Some(geometry) = self.container.geometry() else {
            return 0;
        };

        let requested = self.config.span(count);
        let wanted = requested.min(buf.len() as u64) as usize;
        if wanted == 0 {
            return 0;
        }
        let buf = &mut buf[..wanted];

        let start_byte = self.config.start_byte(sector);
        let start = geometry.locate(start_byte, self.config.data_offset);

        // Only the first hunk is entered mid-way; every later hunk is read
        // from its first byte.
        let mut hunk = start.hunk;
        let mut total = self.container.read_hunk(buf, hunk, start.offset);
        while total > 0 && total < wanted {
            let Some(next) = hunk.checked_add(1) else {
                break;
            };
            hunk = next;

            let read = self.container.read_hunk(&mut buf[total..], hunk, 0);
            if read == 0 {
                break;
            }
            total += read;
        }

        if (total as u64) < requested {
            trace!(sector, count, total, requested, "short read");
        }
        total
    }

    fn begin_read(&mut self, buf: &mut [u8], sector: u32, count: u32) -> ReadHandle {
        let bytes = self.read_sync(buf, sector, count);
        self.pending.complete(bytes)
    }

    fn finish_read(&mut self) -> Option<usize> {
        self.pending.take()
    }

    fn block_count(&self) -> u32 {
        self.container
            .geometry()
            .map_or(0, |g| self.config.block_count(g.logical_size()))
    }

    fn config(&self) -> BlockConfig {
        self.config
    }

    fn set_config(&mut self, config: BlockConfig) {
        self.config = config;
    }
}

impl<S: HunkSource> Default for HunkDiskReader<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for HunkDiskReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HunkDiskReader")
            .field("container", &self.container)
            .field("config", &self.config)
            .field("pending", &self.pending)
            .finish()
    }
}

//! Single-hunk decompression buffer.
//!
//! The cache holds exactly one decompressed hunk and keeps nothing across
//! calls: every [`HunkCache::read_hunk`] decompresses again, even for the hunk
//! it already holds. Memory stays bounded at one hunk per open image.

use tracing::{trace, warn};

use crate::adapter::HunkSource;
use crate::{Error, Geometry, Result};

/// Counters describing cache activity since the container was opened.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HunkCacheStats {
    /// Hunks decompressed successfully.
    pub decompressions: u64,
    /// Hunks the container failed to decompress.
    pub failures: u64,
    /// Requests rejected before touching the container.
    pub rejected: u64,
}

/// One reusable decompressed-hunk buffer.
pub struct HunkCache {
    buffer: Vec<u8>,
    hunk_count: u32,
    stats: HunkCacheStats,
}

impl HunkCache {
    /// Allocate a buffer of exactly one hunk for `geometry`.
    pub fn allocate(geometry: &Geometry) -> Result<Self> {
        let bytes = geometry.hunk_size() as usize;

        let mut buffer = Vec::new();
        buffer
            .try_reserve_exact(bytes)
            .map_err(|_| Error::Allocation { bytes })?;
        buffer.resize(bytes, 0);

        Ok(Self {
            buffer,
            hunk_count: geometry.hunk_count(),
            stats: HunkCacheStats::default(),
        })
    }

    /// Activity counters.
    pub fn stats(&self) -> HunkCacheStats {
        self.stats
    }

    /// Decompress hunk `hunk_index` and copy it from `hunk_offset` into `dest`.
    ///
    /// Copies `min(hunk_size - hunk_offset, dest.len())` bytes and returns the
    /// count. Returns 0 when the hunk is out of range, the offset lies past the
    /// hunk, or decompression fails; the cause is logged but not returned.
    pub fn read_hunk<S: HunkSource>(
        &mut self,
        source: &S,
        dest: &mut [u8],
        hunk_index: u32,
        hunk_offset: u32,
    ) -> usize {
        let offset = hunk_offset as usize;
        if offset >= self.buffer.len() {
            self.stats.rejected += 1;
            return 0;
        }

        let hunk = match self.fetch(source, hunk_index) {
            Ok(hunk) => hunk,
            Err(Error::HunkOutOfRange { index, count }) => {
                trace!(index, count, "hunk out of range");
                return 0;
            }
            Err(e) => {
                warn!("{e}");
                return 0;
            }
        };

        let available = &hunk[offset..];
        let len = available.len().min(dest.len());
        dest[..len].copy_from_slice(&available[..len]);
        len
    }

    /// Decompress hunk `index` into the buffer and return its contents.
    ///
    /// Valid indices are `0..hunk_count`; anything else is rejected without
    /// calling into the container.
    pub fn fetch<S: HunkSource>(&mut self, source: &S, index: u32) -> Result<&[u8]> {
        if index >= self.hunk_count {
            self.stats.rejected += 1;
            return Err(Error::HunkOutOfRange {
                index,
                count: self.hunk_count,
            });
        }

        match source.read_hunk(index, &mut self.buffer) {
            Ok(()) => {
                self.stats.decompressions += 1;
                trace!(index, "decompressed hunk");
                Ok(&self.buffer)
            }
            Err(e) => {
                self.stats.failures += 1;
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for HunkCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HunkCache")
            .field("hunk_size", &self.buffer.len())
            .field("hunk_count", &self.hunk_count)
            .field("stats", &self.stats)
            .finish()
    }
}

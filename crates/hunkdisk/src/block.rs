//! The sector-addressed read contract shared by every image reader.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use tracing::debug;

use crate::Result;

/// Caller-owned addressing configuration.
///
/// Survives [`BlockReader::close`] and reopening; only the caller changes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BlockConfig {
    /// Bytes per sector.
    pub block_size: u32,
    /// Bytes of the decompressed stream skipped before sector 0.
    pub data_offset: u32,
}

impl BlockConfig {
    /// Default sector size (a Mode 1 CD/DVD user-data sector).
    pub const DEFAULT_BLOCK_SIZE: u32 = 2048;

    /// Number of whole blocks in `logical_size` bytes after the data offset.
    ///
    /// Zero when the block size is zero or the offset is past the end;
    /// saturates at `u32::MAX`.
    pub fn block_count(&self, logical_size: u64) -> u32 {
        if self.block_size == 0 {
            return 0;
        }
        let blocks = logical_size.saturating_sub(u64::from(self.data_offset))
            / u64::from(self.block_size);
        u32::try_from(blocks).unwrap_or(u32::MAX)
    }

    /// Byte position of `sector`, before the data offset is applied.
    #[inline]
    pub fn start_byte(&self, sector: u32) -> u64 {
        u64::from(sector) * u64::from(self.block_size)
    }

    /// Bytes covered by `count` sectors.
    #[inline]
    pub fn span(&self, count: u32) -> u64 {
        u64::from(count) * u64::from(self.block_size)
    }
}

impl Default for BlockConfig {
    fn default() -> Self {
        Self {
            block_size: Self::DEFAULT_BLOCK_SIZE,
            data_offset: 0,
        }
    }
}

/// Completion handle returned by [`BlockReader::begin_read`].
///
/// Reads currently run to completion inside `begin_read`, so the handle is
/// always complete and resolves on the first poll. Code that awaits it keeps
/// working once reads become truly overlapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadHandle {
    bytes: usize,
}

impl ReadHandle {
    pub(crate) fn completed(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Whether the read has finished.
    #[inline]
    pub fn is_complete(&self) -> bool {
        true
    }

    /// Bytes transferred by the read.
    #[inline]
    pub fn bytes_read(&self) -> usize {
        self.bytes
    }
}

impl Future for ReadHandle {
    type Output = usize;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<usize> {
        Poll::Ready(self.bytes)
    }
}

/// Latched result of the last `begin_read`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingRead {
    bytes: Option<usize>,
}

impl PendingRead {
    /// Latch a finished read and hand back its completion handle.
    pub fn complete(&mut self, bytes: usize) -> ReadHandle {
        if let Some(stale) = self.bytes.replace(bytes) {
            debug!(stale, "begin_read overwrote an unfinished read");
        }
        ReadHandle::completed(bytes)
    }

    /// Take the latched result, leaving nothing pending.
    pub fn take(&mut self) -> Option<usize> {
        self.bytes.take()
    }

    /// Whether a result is waiting for `finish_read`.
    pub fn is_pending(&self) -> bool {
        self.bytes.is_some()
    }
}

/// A sector-addressed, read-only image.
///
/// Every method takes `&mut self` or `&self` on a single owner, so at most one
/// read is ever in flight per reader. Read failures are reported only as short
/// byte counts.
pub trait BlockReader {
    /// Open `path`, closing any image opened before. On failure the reader is
    /// left closed.
    fn open(&mut self, path: &Path) -> Result<()>;

    /// Release the image. Safe to call any number of times.
    fn close(&mut self);

    /// Whether an image is open.
    fn is_open(&self) -> bool;

    /// Read `count` sectors starting at `sector` into `buf`.
    ///
    /// Returns the number of bytes written, which is less than
    /// `count * block_size` when the image ends or a hunk cannot be read, and
    /// 0 when nothing is open. Never writes past `buf.len()`.
    fn read_sync(&mut self, buf: &mut [u8], sector: u32, count: u32) -> usize;

    /// Start a read. The read has completed when this returns; its byte count
    /// is latched for [`finish_read`](Self::finish_read) and also carried by
    /// the returned handle.
    fn begin_read(&mut self, buf: &mut [u8], sector: u32, count: u32) -> ReadHandle;

    /// Result of the last `begin_read`, or `None` if nothing is pending.
    fn finish_read(&mut self) -> Option<usize>;

    /// Cancel an outstanding read. There is never one to cancel.
    fn cancel_read(&mut self) {}

    /// Whole sectors available after the data offset.
    fn block_count(&self) -> u32;

    /// Current addressing configuration.
    fn config(&self) -> BlockConfig;

    /// Replace the addressing configuration; applies from the next read.
    fn set_config(&mut self, config: BlockConfig);

    /// Set the sector size in bytes.
    fn set_block_size(&mut self, bytes: u32) {
        let config = self.config();
        self.set_config(BlockConfig {
            block_size: bytes,
            ..config
        });
    }

    /// Set the byte offset of sector 0 within the image.
    fn set_data_offset(&mut self, bytes: u32) {
        let config = self.config();
        self.set_config(BlockConfig {
            data_offset: bytes,
            ..config
        });
    }
}

//! Block reader over an uncompressed image file.

use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use crate::block::{BlockConfig, BlockReader, PendingRead, ReadHandle};
use crate::format::has_extension;
use crate::{Error, Result};

/// File extensions accepted as flat images.
pub const FLAT_EXTENSIONS: &[&str] = &["iso", "img", "bin"];

struct FlatImage {
    mmap: Mmap,
    path: PathBuf,
}

/// Reads sectors straight out of a memory-mapped raw image.
pub struct FlatReader {
    image: Option<FlatImage>,
    config: BlockConfig,
    pending: PendingRead,
}

impl FlatReader {
    /// Create a closed reader with the default configuration.
    pub fn new() -> Self {
        Self::with_config(BlockConfig::default())
    }

    /// Create a closed reader with the given configuration.
    pub fn with_config(config: BlockConfig) -> Self {
        Self {
            image: None,
            config,
            pending: PendingRead::default(),
        }
    }

    /// Check whether `path` is a raw image this reader accepts.
    pub fn probe(path: &Path) -> bool {
        path.is_file() && has_extension(path, FLAT_EXTENSIONS) && Self::map(path).is_ok()
    }

    /// Size of the open image in bytes.
    pub fn image_size(&self) -> Option<u64> {
        self.image.as_ref().map(|i| i.mmap.len() as u64)
    }

    /// Path of the open image.
    pub fn path(&self) -> Option<&Path> {
        self.image.as_ref().map(|i| i.path.as_path())
    }

    fn map(path: &Path) -> Result<Mmap> {
        let file = File::open(path)?;
        if file.metadata()?.len() == 0 {
            return Err(Error::InvalidGeometry("image is empty"));
        }
        Ok(unsafe { Mmap::map(&file)? })
    }
}

impl BlockReader for FlatReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        self.close();

        let mmap = Self::map(path)?;
        debug!(path = %path.display(), len = mmap.len(), "flat image opened");
        self.image = Some(FlatImage {
            mmap,
            path: path.to_path_buf(),
        });
        Ok(())
    }

    fn close(&mut self) {
        if let Some(image) = self.image.take() {
            debug!(path = %image.path.display(), "flat image closed");
        }
    }

    fn is_open(&self) -> bool {
        self.image.is_some()
    }

    fn read_sync(&mut self, buf: &mut [u8], sector: u32, count: u32) -> usize {
        let Some(image) = &self.image else {
            return 0;
        };

        let start = self
            .config
            .start_byte(sector)
            .saturating_add(u64::from(self.config.data_offset));
        let Some(available) = (image.mmap.len() as u64).checked_sub(start) else {
            return 0;
        };

        let len = self
            .config
            .span(count)
            .min(available)
            .min(buf.len() as u64) as usize;
        let start = start as usize;
        buf[..len].copy_from_slice(&image.mmap[start..start + len]);
        len
    }

    fn begin_read(&mut self, buf: &mut [u8], sector: u32, count: u32) -> ReadHandle {
        let bytes = self.read_sync(buf, sector, count);
        self.pending.complete(bytes)
    }

    fn finish_read(&mut self) -> Option<usize> {
        self.pending.take()
    }

    fn block_count(&self) -> u32 {
        self.image_size().map_or(0, |len| self.config.block_count(len))
    }

    fn config(&self) -> BlockConfig {
        self.config
    }

    fn set_config(&mut self, config: BlockConfig) {
        self.config = config;
    }
}

impl Default for FlatReader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for FlatReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatReader")
            .field("path", &self.path())
            .field("image_size", &self.image_size())
            .field("config", &self.config)
            .finish()
    }
}

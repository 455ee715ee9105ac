//! Ownership of the open container.
//!
//! [`HunkSource`] is the boundary with the container library: open a path,
//! report header geometry, decompress a hunk into a caller buffer, and close
//! on drop. [`ContainerAdapter`] owns at most one source together with its
//! geometry and hunk buffer, and never exposes a half-open state.

use std::path::{Path, PathBuf};

use hunkdisk_hnk::{HnkFile, HNK_EXTENSION};
use tracing::{debug, warn};

use crate::cache::{HunkCache, HunkCacheStats};
use crate::format::has_extension;
use crate::{Error, Geometry, Result};

/// A container library handle.
pub trait HunkSource: Sized {
    /// File extension (without dot) of containers this source opens.
    const EXTENSION: &'static str;

    /// Open a container read-only.
    fn open(path: &Path) -> Result<Self>;

    /// Geometry from the container header.
    fn geometry(&self) -> Result<Geometry>;

    /// Decompress hunk `index` into `out`, which is exactly one hunk long.
    fn read_hunk(&self, index: u32, out: &mut [u8]) -> Result<()>;
}

impl HunkSource for HnkFile {
    const EXTENSION: &'static str = HNK_EXTENSION;

    fn open(path: &Path) -> Result<Self> {
        Ok(HnkFile::open(path)?)
    }

    fn geometry(&self) -> Result<Geometry> {
        Geometry::new(self.logical_size(), self.hunk_size(), self.hunk_count())
    }

    fn read_hunk(&self, index: u32, out: &mut [u8]) -> Result<()> {
        HnkFile::read_hunk(self, index, out).map_err(|e| Error::Decompression {
            index,
            source: Box::new(e),
        })
    }
}

/// Everything that exists only while a container is open.
struct OpenContainer<S> {
    source: S,
    path: PathBuf,
    geometry: Geometry,
    cache: HunkCache,
}

/// Owns the container handle, its geometry and its hunk buffer.
pub struct ContainerAdapter<S = HnkFile> {
    open: Option<OpenContainer<S>>,
}

impl<S: HunkSource> ContainerAdapter<S> {
    /// Create a closed adapter.
    pub fn new() -> Self {
        Self { open: None }
    }

    /// Check whether `path` is a container this source can open.
    ///
    /// The file must exist and carry the source's extension. The container is
    /// opened and released again before returning.
    pub fn probe(path: &Path) -> bool {
        if !path.is_file() || !has_extension(path, &[S::EXTENSION]) {
            return false;
        }
        S::open(path).is_ok()
    }

    /// Open `path`, closing whatever was open before.
    ///
    /// On failure the adapter is left closed.
    pub fn open(&mut self, path: &Path) -> Result<()> {
        self.close();

        match Self::open_container(path) {
            Ok(container) => {
                debug!(
                    path = %path.display(),
                    logical_size = container.geometry.logical_size(),
                    hunk_size = container.geometry.hunk_size(),
                    hunk_count = container.geometry.hunk_count(),
                    "container opened"
                );
                self.open = Some(container);
                Ok(())
            }
            Err(e) => {
                warn!(path = %path.display(), "failed to open container: {e}");
                Err(e)
            }
        }
    }

    fn open_container(path: &Path) -> Result<OpenContainer<S>> {
        let source = S::open(path)?;
        let geometry = source.geometry()?;
        let cache = HunkCache::allocate(&geometry)?;

        Ok(OpenContainer {
            source,
            path: path.to_path_buf(),
            geometry,
            cache,
        })
    }

    /// Release the container, if any. Safe to call any number of times.
    pub fn close(&mut self) {
        if let Some(container) = self.open.take() {
            debug!(path = %container.path.display(), "container closed");
        }
    }

    /// Whether a container is open.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Path of the open container.
    pub fn path(&self) -> Option<&Path> {
        self.open.as_ref().map(|c| c.path.as_path())
    }

    /// Geometry of the open container.
    pub fn geometry(&self) -> Option<Geometry> {
        self.open.as_ref().map(|c| c.geometry)
    }

    /// Hunk cache counters of the open container.
    pub fn cache_stats(&self) -> Option<HunkCacheStats> {
        self.open.as_ref().map(|c| c.cache.stats())
    }

    /// Borrow the open container handle.
    pub fn source(&self) -> Option<&S> {
        self.open.as_ref().map(|c| &c.source)
    }

    /// Copy bytes of hunk `hunk_index`, starting at `hunk_offset`, into `dest`.
    ///
    /// Returns the number of bytes copied; 0 when closed or when the hunk
    /// cannot be read.
    pub fn read_hunk(&mut self, dest: &mut [u8], hunk_index: u32, hunk_offset: u32) -> usize {
        match self.open.as_mut() {
            Some(c) => c.cache.read_hunk(&c.source, dest, hunk_index, hunk_offset),
            None => 0,
        }
    }
}

impl<S: HunkSource> Default for ContainerAdapter<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> std::fmt::Debug for ContainerAdapter<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerAdapter")
            .field("path", &self.open.as_ref().map(|c| &c.path))
            .field("geometry", &self.open.as_ref().map(|c| c.geometry))
            .finish()
    }
}

//! Image format detection and reader dispatch.

use std::path::Path;

use crate::block::{BlockConfig, BlockReader, ReadHandle};
use crate::flat::{FlatReader, FLAT_EXTENSIONS};
use crate::reader::HunkDiskReader;
use crate::{Error, Geometry, Result};

/// Supported image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    /// Hunk-compressed HNK container.
    Hnk,
    /// Uncompressed raw image.
    Flat,
}

impl ImageFormat {
    /// All formats, in detection order.
    pub const ALL: [ImageFormat; 2] = [ImageFormat::Hnk, ImageFormat::Flat];

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Hnk => "HNK",
            Self::Flat => "flat",
        }
    }

    /// File extensions this format is recognized by.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Hnk => &[hunkdisk_hnk::HNK_EXTENSION],
            Self::Flat => FLAT_EXTENSIONS,
        }
    }

    /// Run this format's probe on `path`.
    pub fn probe(self, path: &Path) -> bool {
        match self {
            Self::Hnk => HunkDiskReader::<hunkdisk_hnk::HnkFile>::probe(path),
            Self::Flat => FlatReader::probe(path),
        }
    }

    /// Find the first format whose probe accepts `path`.
    pub fn detect(path: &Path) -> Option<Self> {
        Self::ALL.into_iter().find(|format| format.probe(path))
    }

    /// A closed reader for this format.
    pub fn reader(self, config: BlockConfig) -> AnyReader {
        match self {
            Self::Hnk => AnyReader::Hnk(HunkDiskReader::with_config(config)),
            Self::Flat => AnyReader::Flat(FlatReader::with_config(config)),
        }
    }
}

impl std::fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A reader for any supported format.
#[derive(Debug)]
pub enum AnyReader {
    Hnk(HunkDiskReader),
    Flat(FlatReader),
}

macro_rules! dispatch {
    ($self:expr, $reader:ident => $body:expr) => {
        match $self {
            AnyReader::Hnk($reader) => $body,
            AnyReader::Flat($reader) => $body,
        }
    };
}

impl AnyReader {
    /// Detect the format of `path` and open it with the default configuration.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path, BlockConfig::default())
    }

    /// Detect the format of `path` and open it with `config`.
    pub fn open_with<P: AsRef<Path>>(path: P, config: BlockConfig) -> Result<Self> {
        let path = path.as_ref();
        let format =
            ImageFormat::detect(path).ok_or_else(|| Error::UnknownFormat(path.to_path_buf()))?;

        let mut reader = format.reader(config);
        BlockReader::open(&mut reader, path)?;
        Ok(reader)
    }

    /// Format of this reader.
    pub fn format(&self) -> ImageFormat {
        match self {
            Self::Hnk(_) => ImageFormat::Hnk,
            Self::Flat(_) => ImageFormat::Flat,
        }
    }

    /// Hunk geometry, for compressed formats.
    pub fn geometry(&self) -> Option<Geometry> {
        match self {
            Self::Hnk(reader) => reader.geometry(),
            Self::Flat(_) => None,
        }
    }

    /// Size of the image's logical byte stream.
    pub fn logical_size(&self) -> Option<u64> {
        match self {
            Self::Hnk(reader) => reader.geometry().map(|g| g.logical_size()),
            Self::Flat(reader) => reader.image_size(),
        }
    }
}

impl BlockReader for AnyReader {
    fn open(&mut self, path: &Path) -> Result<()> {
        dispatch!(self, r => r.open(path))
    }

    fn close(&mut self) {
        dispatch!(self, r => r.close())
    }

    fn is_open(&self) -> bool {
        dispatch!(self, r => r.is_open())
    }

    fn read_sync(&mut self, buf: &mut [u8], sector: u32, count: u32) -> usize {
        dispatch!(self, r => r.read_sync(buf, sector, count))
    }

    fn begin_read(&mut self, buf: &mut [u8], sector: u32, count: u32) -> ReadHandle {
        dispatch!(self, r => r.begin_read(buf, sector, count))
    }

    fn finish_read(&mut self) -> Option<usize> {
        dispatch!(self, r => r.finish_read())
    }

    fn cancel_read(&mut self) {
        dispatch!(self, r => r.cancel_read())
    }

    fn block_count(&self) -> u32 {
        dispatch!(self, r => r.block_count())
    }

    fn config(&self) -> BlockConfig {
        dispatch!(self, r => r.config())
    }

    fn set_config(&mut self, config: BlockConfig) {
        dispatch!(self, r => r.set_config(config))
    }
}

/// Case-insensitive extension check.
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| extensions.iter().any(|want| ext.eq_ignore_ascii_case(want)))
}

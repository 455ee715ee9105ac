//! HNK container writer.
//!
//! Cuts a raw image into hunks, compresses every hunk on its own and writes
//! the header, hunk data and hunk map.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use hunkdisk_common::{crc, IntoBytes};
use tracing::debug;

use crate::codec;
use crate::format::{Codec, HnkHeader, HunkMapEntry};
use crate::{Error, Result};

/// Options controlling how a container is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterOptions {
    /// Decompressed size of each hunk in bytes.
    pub hunk_size: u32,
    /// Preferred codec. Hunks that do not shrink are stored instead.
    pub codec: Codec,
    /// Codec compression level.
    pub level: i32,
}

impl WriterOptions {
    /// Default hunk size: eight 2448-byte raw CD frames.
    pub const DEFAULT_HUNK_SIZE: u32 = 8 * 2448;
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self {
            hunk_size: Self::DEFAULT_HUNK_SIZE,
            codec: Codec::Zstd,
            level: 3,
        }
    }
}

/// Summary of a written container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HnkSummary {
    /// Logical size of the source image.
    pub logical_size: u64,
    /// Hunk size used.
    pub hunk_size: u32,
    /// Number of hunks written.
    pub hunk_count: u32,
    /// Total size of the container file.
    pub file_size: u64,
    /// Hunks that were stored uncompressed.
    pub stored_hunks: u32,
}

/// Writes HNK containers.
#[derive(Debug, Clone)]
pub struct HnkWriter {
    options: WriterOptions,
}

impl HnkWriter {
    /// Create a writer with the given options.
    pub fn new(options: WriterOptions) -> Result<Self> {
        if options.hunk_size == 0 {
            return Err(Error::InvalidGeometry("hunk size is zero"));
        }
        Ok(Self { options })
    }

    /// Get the writer options.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Write `data` as a container at `path`.
    pub fn write<P: AsRef<Path>>(&self, data: &[u8], path: P) -> Result<HnkSummary> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        let summary = self.write_to(data, &mut out)?;
        out.flush()?;
        Ok(summary)
    }

    /// Write `data` as a container into any writer.
    pub fn write_to<W: Write>(&self, data: &[u8], mut out: W) -> Result<HnkSummary> {
        let hunk_size = self.options.hunk_size;
        let hunks = self.compress_hunks(data)?;
        let hunk_count = u32::try_from(hunks.len())
            .map_err(|_| Error::InvalidGeometry("image needs more than u32::MAX hunks"))?;

        let mut map = Vec::with_capacity(hunks.len());
        let mut offset = HnkHeader::DATA_START;
        let mut stored_hunks = 0;
        for (codec, bytes) in &hunks {
            if *codec == Codec::Store {
                stored_hunks += 1;
            }
            map.push(HunkMapEntry::new(offset, bytes.len() as u32, *codec));
            offset += bytes.len() as u64;
        }
        let map_bytes = map.as_bytes();

        let mut header = HnkHeader {
            version: HnkHeader::VERSION,
            flags: 0,
            hunk_size,
            hunk_count,
            reserved: 0,
            logical_size: data.len() as u64,
            map_offset: offset,
            map_crc: crc::checksum(map_bytes),
            header_crc: 0,
        };
        header.header_crc = header.compute_crc();

        out.write_all(HnkHeader::MAGIC)?;
        out.write_all(header.as_bytes())?;
        for (_, bytes) in &hunks {
            out.write_all(bytes)?;
        }
        out.write_all(map_bytes)?;

        let summary = HnkSummary {
            logical_size: data.len() as u64,
            hunk_size,
            hunk_count,
            file_size: offset + map_bytes.len() as u64,
            stored_hunks,
        };

        debug!(
            hunk_count,
            stored_hunks,
            file_size = summary.file_size,
            "wrote HNK container"
        );

        Ok(summary)
    }

    #[cfg(feature = "parallel")]
    fn compress_hunks(&self, data: &[u8]) -> Result<Vec<(Codec, Vec<u8>)>> {
        use rayon::prelude::*;

        data.par_chunks(self.options.hunk_size as usize)
            .map(|chunk| self.compress_hunk(chunk))
            .collect()
    }

    #[cfg(not(feature = "parallel"))]
    fn compress_hunks(&self, data: &[u8]) -> Result<Vec<(Codec, Vec<u8>)>> {
        data.chunks(self.options.hunk_size as usize)
            .map(|chunk| self.compress_hunk(chunk))
            .collect()
    }

    fn compress_hunk(&self, chunk: &[u8]) -> Result<(Codec, Vec<u8>)> {
        let hunk_size = self.options.hunk_size as usize;

        // The final hunk is zero-padded up to the full hunk size.
        let padded;
        let hunk = if chunk.len() < hunk_size {
            let mut buf = chunk.to_vec();
            buf.resize(hunk_size, 0);
            padded = buf;
            &padded[..]
        } else {
            chunk
        };

        if self.options.codec != Codec::Store {
            let compressed = codec::compress(self.options.codec, hunk, self.options.level)?;
            if compressed.len() < hunk_size {
                return Ok((self.options.codec, compressed));
            }
        }

        Ok((Codec::Store, hunk.to_vec()))
    }
}

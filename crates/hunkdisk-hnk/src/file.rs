//! Memory-mapped HNK container reader.

use std::fs::File;
use std::path::Path;

use hunkdisk_common::{crc, BinaryReader};
use memmap2::Mmap;
use tracing::debug;

use crate::codec;
use crate::format::{Codec, HnkHeader, HunkMapEntry};
use crate::{Error, Result};

/// An open HNK container.
///
/// The file is memory-mapped for the lifetime of the value; dropping it
/// releases the mapping. [`read_hunk`](Self::read_hunk) takes `&self`, so one
/// open file can serve several readers as long as each brings its own buffer.
pub struct HnkFile {
    /// Memory-mapped file data
    mmap: Mmap,
    /// Container file name
    name: String,
    /// Validated header
    header: HnkHeader,
    /// Hunk map, one entry per hunk
    map: Vec<HunkMapEntry>,
}

impl HnkFile {
    /// Open and validate an HNK container.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;

        let len = file.metadata()?.len();
        let minimum = HnkHeader::DATA_START;
        if len < minimum {
            return Err(hunkdisk_common::Error::UnexpectedEof {
                needed: minimum as usize,
                available: len as usize,
            }
            .into());
        }

        let mmap = unsafe { Mmap::map(&file)? };

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let (header, map) = Self::parse(&mmap)?;
        let file = Self {
            mmap,
            name,
            header,
            map,
        };

        debug!(
            name = %file.name,
            logical_size = file.logical_size(),
            hunk_size = file.hunk_size(),
            hunk_count = file.hunk_count(),
            "opened HNK container"
        );

        Ok(file)
    }

    /// Get the container file name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the validated header.
    #[inline]
    pub fn header(&self) -> &HnkHeader {
        &self.header
    }

    /// Logical (uncompressed) size of the image.
    #[inline]
    pub fn logical_size(&self) -> u64 {
        self.header.logical_size
    }

    /// Decompressed size of each hunk.
    #[inline]
    pub fn hunk_size(&self) -> u32 {
        self.header.hunk_size
    }

    /// Number of hunks.
    #[inline]
    pub fn hunk_count(&self) -> u32 {
        self.header.hunk_count
    }

    /// Size of the container file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.mmap.len() as u64
    }

    /// Get the map entry of a hunk.
    pub fn entry(&self, index: u32) -> Option<HunkMapEntry> {
        self.map.get(index as usize).copied()
    }

    /// Decompress hunk `index` into `out`.
    ///
    /// `out` must be exactly [`hunk_size`](Self::hunk_size) bytes long. On error
    /// the contents of `out` are unspecified.
    pub fn read_hunk(&self, index: u32, out: &mut [u8]) -> Result<()> {
        let hunk_size = self.header.hunk_size as usize;
        if out.len() != hunk_size {
            return Err(Error::BufferSize {
                expected: hunk_size,
                actual: out.len(),
            });
        }

        let entry = self.map.get(index as usize).ok_or(Error::HunkOutOfRange {
            index,
            count: self.header.hunk_count,
        })?;

        let range = entry
            .file_range()
            .filter(|r| r.end <= self.mmap.len() as u64)
            .ok_or(Error::HunkOutOfBounds { index })?;

        let codec = Codec::try_from(entry.codec).map_err(Error::UnsupportedCodec)?;
        let data = &self.mmap[range.start as usize..range.end as usize];

        codec::decompress_into(codec, data, out)
    }

    fn parse(data: &[u8]) -> Result<(HnkHeader, Vec<HunkMapEntry>)> {
        let mut reader = BinaryReader::new(data);
        reader.expect_magic(HnkHeader::MAGIC)?;
        let header: HnkHeader = reader.read_struct()?;

        let version = header.version;
        if version != HnkHeader::VERSION {
            return Err(Error::UnsupportedVersion(version));
        }

        let computed = header.compute_crc();
        if header.header_crc != computed {
            return Err(Error::HeaderChecksum {
                stored: header.header_crc,
                computed,
            });
        }

        if header.hunk_size == 0 {
            return Err(Error::InvalidGeometry("hunk size is zero"));
        }
        if header.capacity() < header.logical_size {
            return Err(Error::InvalidGeometry(
                "hunks do not cover the logical size",
            ));
        }

        let map_len = header.hunk_count as usize * HunkMapEntry::SIZE;
        let map_start = usize::try_from(header.map_offset)
            .map_err(|_| Error::InvalidGeometry("hunk map offset overflows"))?;
        let map_bytes = data
            .get(map_start..)
            .and_then(|rest| rest.get(..map_len))
            .ok_or(hunkdisk_common::Error::UnexpectedEof {
                needed: map_len,
                available: data.len().saturating_sub(map_start),
            })?;

        let computed = crc::checksum(map_bytes);
        if header.map_crc != computed {
            return Err(Error::MapChecksum {
                stored: header.map_crc,
                computed,
            });
        }

        let mut map_reader = BinaryReader::new(map_bytes);
        let mut map = Vec::with_capacity(header.hunk_count as usize);
        for _ in 0..header.hunk_count {
            map.push(map_reader.read_struct::<HunkMapEntry>()?);
        }

        Ok((header, map))
    }
}

impl std::fmt::Debug for HnkFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HnkFile")
            .field("name", &self.name)
            .field("logical_size", &self.logical_size())
            .field("hunk_size", &self.hunk_size())
            .field("hunk_count", &self.hunk_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{HnkWriter, WriterOptions};

    fn options(hunk_size: u32, codec: Codec) -> WriterOptions {
        WriterOptions {
            hunk_size,
            codec,
            level: 3,
        }
    }

    fn pattern(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 + i / 256) as u8).collect()
    }

    fn write_image(dir: &tempfile::TempDir, data: &[u8], opts: WriterOptions) -> std::path::PathBuf {
        let path = dir.path().join("image.hnk");
        HnkWriter::new(opts).unwrap().write(data, &path).unwrap();
        path
    }

    #[test]
    fn test_open_reports_geometry() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(10_000);
        let path = write_image(&dir, &data, options(4096, Codec::Zstd));

        let file = HnkFile::open(&path).unwrap();
        assert_eq!(file.name(), "image.hnk");
        assert_eq!(file.logical_size(), 10_000);
        assert_eq!(file.hunk_size(), 4096);
        assert_eq!(file.hunk_count(), 3);
    }

    #[test]
    fn test_read_every_hunk() {
        let dir = tempfile::tempdir().unwrap();
        let data = pattern(10_000);

        for codec in [Codec::Store, Codec::Deflate, Codec::Zstd] {
            let path = write_image(&dir, &data, options(4096, codec));
            let file = HnkFile::open(&path).unwrap();

            let mut decoded = Vec::new();
            let mut hunk = vec![0u8; 4096];
            for index in 0..file.hunk_count() {
                file.read_hunk(index, &mut hunk).unwrap();
                decoded.extend_from_slice(&hunk);
            }

            assert_eq!(&decoded[..data.len()], &data[..], "codec {codec}");
            // The tail of the last hunk is zero padding.
            assert!(decoded[data.len()..].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn test_read_hunk_rejects_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, &pattern(8192), options(4096, Codec::Zstd));
        let file = HnkFile::open(&path).unwrap();

        let mut hunk = vec![0u8; 4096];
        assert!(matches!(
            file.read_hunk(2, &mut hunk),
            Err(Error::HunkOutOfRange { index: 2, count: 2 })
        ));

        let mut small = vec![0u8; 100];
        assert!(matches!(
            file.read_hunk(0, &mut small),
            Err(Error::BufferSize { expected: 4096, actual: 100 })
        ));
    }

    #[test]
    fn test_corrupted_hunk_fails_only_that_hunk() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, &pattern(12_288), options(4096, Codec::Zstd));

        let entry = HnkFile::open(&path).unwrap().entry(1).unwrap();
        let mut bytes = std::fs::read(&path).unwrap();
        let start = entry.offset as usize;
        let end = start + entry.length as usize;
        for b in &mut bytes[start..end] {
            *b = !*b;
        }
        std::fs::write(&path, &bytes).unwrap();

        let file = HnkFile::open(&path).unwrap();
        let mut hunk = vec![0u8; 4096];
        file.read_hunk(0, &mut hunk).unwrap();
        assert!(file.read_hunk(1, &mut hunk).is_err());
        file.read_hunk(2, &mut hunk).unwrap();
    }

    #[test]
    fn test_rejects_foreign_and_damaged_files() {
        let dir = tempfile::tempdir().unwrap();

        let foreign = dir.path().join("foreign.hnk");
        std::fs::write(&foreign, vec![0x42u8; 256]).unwrap();
        assert!(matches!(
            HnkFile::open(&foreign),
            Err(Error::Common(hunkdisk_common::Error::InvalidMagic { .. }))
        ));

        let tiny = dir.path().join("tiny.hnk");
        std::fs::write(&tiny, b"HUNK").unwrap();
        assert!(HnkFile::open(&tiny).is_err());

        let path = write_image(&dir, &pattern(8192), options(4096, Codec::Zstd));
        let mut bytes = std::fs::read(&path).unwrap();
        // Flip a byte of hunk_size inside the header.
        bytes[12] ^= 0xFF;
        std::fs::write(&path, &bytes).unwrap();
        assert!(matches!(
            HnkFile::open(&path),
            Err(Error::HeaderChecksum { .. })
        ));
    }

    #[test]
    fn test_rejects_damaged_map() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_image(&dir, &pattern(8192), options(4096, Codec::Zstd));

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        std::fs::write(&path, &bytes).unwrap();

        assert!(matches!(
            HnkFile::open(&path),
            Err(Error::MapChecksum { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            HnkFile::open("/nonexistent/image.hnk"),
            Err(Error::Io(_))
        ));
    }
}

//! HNK file header.

use hunkdisk_common::crc;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// HNK file header (without magic).
///
/// This structure follows the 8-byte magic "HUNKDSK\0" at the start of the file.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HnkHeader {
    /// Format version.
    pub version: u16,
    /// Reserved flags, always zero.
    pub flags: u16,
    /// Decompressed size of every hunk in bytes.
    pub hunk_size: u32,
    /// Number of hunks in the hunk map.
    pub hunk_count: u32,
    /// Reserved, always zero.
    pub reserved: u32,
    /// Logical (uncompressed) size of the image in bytes.
    pub logical_size: u64,
    /// File offset of the hunk map.
    pub map_offset: u64,
    /// CRC32C of the hunk map bytes.
    pub map_crc: u32,
    /// CRC32C of the magic and every header byte before this field.
    pub header_crc: u32,
}

impl HnkHeader {
    /// The magic bytes at the start of an HNK file.
    pub const MAGIC: &'static [u8; 8] = b"HUNKDSK\0";

    /// Size of the magic bytes.
    pub const MAGIC_LEN: usize = 8;

    /// Size of the header in bytes.
    pub const SIZE: usize = 40;

    /// Current format version.
    pub const VERSION: u16 = 1;

    /// Offset of the first hunk's data.
    pub const DATA_START: u64 = (Self::MAGIC_LEN + Self::SIZE) as u64;

    /// Compute the header checksum over the magic and all fields before `header_crc`.
    pub fn compute_crc(&self) -> u32 {
        let bytes = self.as_bytes();
        crc::checksum_parts(&[Self::MAGIC, &bytes[..Self::SIZE - 4]])
    }

    /// Total decompressed capacity of all hunks.
    pub fn capacity(&self) -> u64 {
        u64::from(self.hunk_count) * u64::from(self.hunk_size)
    }
}

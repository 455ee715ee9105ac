//! Hunk map entries.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// One entry of the hunk map: where a compressed hunk lives and how it is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
pub struct HunkMapEntry {
    /// File offset of the compressed hunk.
    pub offset: u64,
    /// Compressed length in bytes.
    pub length: u32,
    /// Codec tag, see [`Codec`](super::Codec).
    pub codec: u8,
    /// Reserved, always zero.
    pub reserved: [u8; 3],
}

impl HunkMapEntry {
    /// Size of a map entry in bytes.
    pub const SIZE: usize = 16;

    /// Create a map entry.
    pub fn new(offset: u64, length: u32, codec: super::Codec) -> Self {
        Self {
            offset,
            length,
            codec: codec as u8,
            reserved: [0; 3],
        }
    }

    /// Byte range of the compressed hunk within the file, if it does not overflow.
    pub fn file_range(&self) -> Option<std::ops::Range<u64>> {
        let start = self.offset;
        let end = start.checked_add(u64::from(self.length))?;
        Some(start..end)
    }
}

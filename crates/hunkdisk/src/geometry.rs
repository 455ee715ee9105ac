//! Hunk geometry and byte-to-hunk translation.

use crate::{Error, Result};

/// Geometry of an open container, read once from its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    logical_size: u64,
    hunk_size: u32,
    hunk_count: u32,
}

/// A byte position expressed as a hunk and an offset into that hunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HunkPosition {
    /// Hunk index.
    pub hunk: u32,
    /// Offset into the hunk, always below the hunk size.
    pub offset: u32,
}

impl Geometry {
    /// Create a geometry, checking that `hunk_size > 0` and that the hunks
    /// cover `logical_size`.
    pub fn new(logical_size: u64, hunk_size: u32, hunk_count: u32) -> Result<Self> {
        if hunk_size == 0 {
            return Err(Error::InvalidGeometry("hunk size is zero"));
        }
        if u64::from(hunk_count) * u64::from(hunk_size) < logical_size {
            return Err(Error::InvalidGeometry(
                "hunks do not cover the logical size",
            ));
        }
        Ok(Self {
            logical_size,
            hunk_size,
            hunk_count,
        })
    }

    /// Logical (uncompressed) size in bytes.
    #[inline]
    pub const fn logical_size(&self) -> u64 {
        self.logical_size
    }

    /// Decompressed size of each hunk.
    #[inline]
    pub const fn hunk_size(&self) -> u32 {
        self.hunk_size
    }

    /// Number of hunks.
    #[inline]
    pub const fn hunk_count(&self) -> u32 {
        self.hunk_count
    }

    /// Whether `index` names a hunk of the container, i.e. `index < hunk_count`.
    #[inline]
    pub const fn contains_hunk(&self, index: u32) -> bool {
        index < self.hunk_count
    }

    /// Index of the hunk holding `byte_index` once shifted by `data_offset`.
    ///
    /// The division is done in 64 bits. An index that does not fit in `u32`
    /// is clamped to `u32::MAX`, which [`contains_hunk`](Self::contains_hunk)
    /// always rejects since hunk counts are themselves `u32`.
    #[inline]
    pub fn hunk_of(&self, byte_index: u64, data_offset: u32) -> u32 {
        let hunk = shifted(byte_index, data_offset) / u64::from(self.hunk_size);
        u32::try_from(hunk).unwrap_or(u32::MAX)
    }

    /// Offset of `byte_index`, shifted by `data_offset`, within its hunk.
    #[inline]
    pub fn offset_into_hunk(&self, byte_index: u64, data_offset: u32) -> u32 {
        // The remainder is below hunk_size, so it always fits.
        (shifted(byte_index, data_offset) % u64::from(self.hunk_size)) as u32
    }

    /// Translate a byte index into a hunk position.
    #[inline]
    pub fn locate(&self, byte_index: u64, data_offset: u32) -> HunkPosition {
        HunkPosition {
            hunk: self.hunk_of(byte_index, data_offset),
            offset: self.offset_into_hunk(byte_index, data_offset),
        }
    }
}

#[inline]
fn shifted(byte_index: u64, data_offset: u32) -> u64 {
    byte_index.saturating_add(u64::from(data_offset))
}

//! HNK on-disk structures.
//!
//! Layout (all little-endian):
//!
//! ```text
//! 0        magic "HUNKDSK\0"
//! 8        HnkHeader (40 bytes)
//! 48       compressed hunks, back to back
//! map      hunk_count x HunkMapEntry (16 bytes each)
//! ```

mod header;
mod map;

pub use header::HnkHeader;
pub use map::HunkMapEntry;

/// Per-hunk compression codecs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Codec {
    /// No compression (stored).
    Store = 0,
    /// DEFLATE compression.
    Deflate = 1,
    /// Zstandard compression.
    Zstd = 2,
}

impl Codec {
    /// Short lowercase name, as shown by tools.
    pub fn name(self) -> &'static str {
        match self {
            Self::Store => "store",
            Self::Deflate => "deflate",
            Self::Zstd => "zstd",
        }
    }
}

impl TryFrom<u8> for Codec {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Store),
            1 => Ok(Self::Deflate),
            2 => Ok(Self::Zstd),
            other => Err(other),
        }
    }
}

impl std::fmt::Display for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

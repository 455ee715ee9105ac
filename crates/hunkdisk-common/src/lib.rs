//! Common utilities for hunkdisk.
//!
//! This crate provides the foundational pieces shared by the hunkdisk crates:
//!
//! - [`BinaryReader`] - Zero-copy binary reading from byte slices
//! - [`crc`] - CRC32C checksum helpers used by on-disk headers

mod error;
mod reader;

pub mod crc;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export zerocopy traits for convenience
pub use zerocopy::{FromBytes, IntoBytes};

//! Zero-copy cursor over a byte slice.
//!
//! [`BinaryReader`] parses container headers and hunk maps straight out of a
//! memory mapping: each read splits the next bytes off the front of the
//! remaining slice.

use zerocopy::FromBytes;

use crate::{Error, Result};

/// Consumes packed records and magic values from the front of a byte slice.
///
/// # Example
///
/// ```
/// use hunkdisk_common::BinaryReader;
/// use zerocopy::byteorder::little_endian::U32;
///
/// let data = *b"HNK\0\x01\x02\x03\x04";
/// let mut reader = BinaryReader::new(&data);
///
/// reader.expect_magic(b"HNK\0").unwrap();
/// let value: U32 = reader.read_struct().unwrap();
/// assert_eq!(value.get(), 0x04030201);
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    rest: &'a [u8],
}

impl<'a> BinaryReader<'a> {
    /// Create a reader positioned at the start of `data`.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { rest: data }
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        if self.rest.len() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.rest.len(),
            });
        }
        let (head, tail) = self.rest.split_at(count);
        self.rest = tail;
        Ok(head)
    }

    /// Read a packed record.
    #[inline]
    pub fn read_struct<T: FromBytes>(&mut self) -> Result<T> {
        let size = std::mem::size_of::<T>();
        let bytes = self.take(size)?;
        T::read_from_bytes(bytes).map_err(|_| Error::UnexpectedEof {
            needed: size,
            available: bytes.len(),
        })
    }

    /// Consume `expected.len()` bytes and check they equal `expected`.
    pub fn expect_magic(&mut self, expected: &[u8]) -> Result<()> {
        let actual = self.take(expected.len())?;
        if actual != expected {
            return Err(Error::InvalidMagic {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use zerocopy::byteorder::little_endian::{U16, U64};

    use super::*;

    #[test]
    fn test_records_follow_magic() {
        let mut data = b"HUNKDSK\0".to_vec();
        data.extend_from_slice(&0x8000_0000_0000_0010u64.to_le_bytes());
        data.extend_from_slice(&0xBEEFu16.to_le_bytes());

        let mut reader = BinaryReader::new(&data);
        reader.expect_magic(b"HUNKDSK\0").unwrap();
        assert_eq!(reader.read_struct::<U64>().unwrap().get(), 0x8000_0000_0000_0010);
        assert_eq!(reader.read_struct::<U16>().unwrap().get(), 0xBEEF);
        assert!(matches!(
            reader.read_struct::<U16>(),
            Err(Error::UnexpectedEof { needed: 2, available: 0 })
        ));
    }

    #[test]
    fn test_wrong_magic() {
        let mut reader = BinaryReader::new(b"NOTMAGICrest");
        let err = reader.expect_magic(b"HUNKDSK\0").unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidMagic { ref actual, .. } if actual == b"NOTMAGIC"
        ));
    }

    #[test]
    fn test_truncated_input() {
        let mut reader = BinaryReader::new(b"HUNK");
        assert!(matches!(
            reader.expect_magic(b"HUNKDSK\0"),
            Err(Error::UnexpectedEof { needed: 8, available: 4 })
        ));

        let mut reader = BinaryReader::new(&[0x01, 0x02, 0x03]);
        assert!(matches!(
            reader.read_struct::<U64>(),
            Err(Error::UnexpectedEof { needed: 8, available: 3 })
        ));
    }
}

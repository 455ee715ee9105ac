//! Per-hunk compression and decompression.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;

use crate::{Codec, Error, Result};

/// Decompress one hunk into `out`, which must be exactly the hunk size.
///
/// The encoded data has to expand to exactly `out.len()` bytes; shorter or
/// longer output is a decompression error.
pub fn decompress_into(codec: Codec, data: &[u8], out: &mut [u8]) -> Result<()> {
    match codec {
        Codec::Store => {
            if data.len() != out.len() {
                return Err(Error::Decompression(format!(
                    "stored hunk size mismatch: expected {}, got {}",
                    out.len(),
                    data.len()
                )));
            }
            out.copy_from_slice(data);
            Ok(())
        }
        Codec::Deflate => fill_exact(DeflateDecoder::new(data), out),
        Codec::Zstd => {
            let decoder =
                zstd::Decoder::new(data).map_err(|e| Error::Decompression(e.to_string()))?;
            fill_exact(decoder, out)
        }
    }
}

/// Compress one hunk with the given codec.
pub fn compress(codec: Codec, data: &[u8], level: i32) -> Result<Vec<u8>> {
    match codec {
        Codec::Store => Ok(data.to_vec()),
        Codec::Deflate => {
            let level = level.clamp(0, 9) as u32;
            let mut encoder = DeflateEncoder::new(Vec::new(), Compression::new(level));
            encoder
                .write_all(data)
                .map_err(|e| Error::Compression(e.to_string()))?;
            encoder
                .finish()
                .map_err(|e| Error::Compression(e.to_string()))
        }
        Codec::Zstd => {
            zstd::encode_all(data, level).map_err(|e| Error::Compression(e.to_string()))
        }
    }
}

fn fill_exact<R: Read>(mut reader: R, out: &mut [u8]) -> Result<()> {
    reader
        .read_exact(out)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    // Anything left over means the hunk was encoded with a different size.
    let mut extra = [0u8; 1];
    match reader.read(&mut extra) {
        Ok(0) => Ok(()),
        Ok(_) => Err(Error::Decompression(format!(
            "hunk decodes to more than {} bytes",
            out.len()
        ))),
        Err(e) => Err(Error::Decompression(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8 ^ (i / 1024) as u8).collect()
    }

    #[test]
    fn test_zstd_hunk() {
        let original = sample(4096);
        let compressed = compress(Codec::Zstd, &original, 3).unwrap();

        let mut out = vec![0u8; original.len()];
        decompress_into(Codec::Zstd, &compressed, &mut out).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_deflate_hunk() {
        let original = sample(4096);
        let compressed = compress(Codec::Deflate, &original, 6).unwrap();
        assert!(compressed.len() < original.len());

        let mut out = vec![0u8; original.len()];
        decompress_into(Codec::Deflate, &compressed, &mut out).unwrap();
        assert_eq!(out, original);
    }

    #[test]
    fn test_size_mismatch_is_rejected() {
        let original = sample(1000);
        let compressed = compress(Codec::Zstd, &original, 3).unwrap();

        let mut short = vec![0u8; 1200];
        assert!(matches!(
            decompress_into(Codec::Zstd, &compressed, &mut short),
            Err(Error::Decompression(_))
        ));

        let mut long = vec![0u8; 800];
        assert!(matches!(
            decompress_into(Codec::Zstd, &compressed, &mut long),
            Err(Error::Decompression(_))
        ));

        let mut stored = vec![0u8; 999];
        assert!(decompress_into(Codec::Store, &original, &mut stored).is_err());
    }

    #[test]
    fn test_garbage_fails_to_decode() {
        let garbage = vec![0xA5u8; 64];
        let mut out = vec![0u8; 512];
        assert!(decompress_into(Codec::Zstd, &garbage, &mut out).is_err());
        assert!(decompress_into(Codec::Deflate, &garbage, &mut out).is_err());
    }
}

//! CRC32C checksum utilities.
//!
//! Container headers and hunk maps carry a CRC32C (Castagnoli) so that a
//! truncated or foreign file is rejected before any hunk is touched.

/// Compute the CRC32C of a byte slice.
///
/// Uses hardware acceleration when available (SSE4.2 on x86).
#[inline]
pub fn checksum(data: &[u8]) -> u32 {
    crc32c::crc32c(data)
}

/// Compute the CRC32C of several slices as if they were contiguous.
pub fn checksum_parts(parts: &[&[u8]]) -> u32 {
    parts
        .iter()
        .fold(0, |crc, part| crc32c::crc32c_append(crc, part))
}

//! CRC-32 as computed by the Tapecart firmware
//!
//! Reflected polynomial 0xEDB88320, seed 0xFFFFFFFF, final complement
//! (the zlib/PNG variant).

/// CRC-32 of `data`
pub fn calculate_crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

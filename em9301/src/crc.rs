//! CRC-32 as expected by the EM9304 patch commands.
//!
//! Every patch chunk carries the reflected CRC-32 (polynomial `0xEDB88320`, the same
//! checksum zip and Ethernet use) of exactly the bytes in that chunk. The implementation
//! uses a 16 entry table and consumes every byte as two nibbles, which keeps the table
//! small enough for the controllers this crate is usually paired with.

/// Remainders of the reflected polynomial `0xEDB88320` for every 4 bit value.
const CRC32_NIBBLE_TABLE: [u32; 16] = [
    0x0000_0000,
    0x1db7_1064,
    0x3b6e_20c8,
    0x26d9_30ac,
    0x76dc_4190,
    0x6b6b_51f4,
    0x4db2_6158,
    0x5005_713c,
    0xedb8_8320,
    0xf00f_9344,
    0xd6d6_a3e8,
    0xcb61_b38c,
    0x9b64_c2b0,
    0x86d3_d2d4,
    0xa00a_e278,
    0xbdbd_f21c,
];

/// Calculate the CRC-32 of `data`.
///
/// ```
/// assert_eq!(em9301::crc::crc32(b"123456789"), 0xCBF4_3926);
/// ```
pub fn crc32(data: &[u8]) -> u32 {
    let mut hasher = Crc32::new();
    hasher.update(data);
    hasher.finalize()
}

/// Incremental CRC-32 hasher.
///
/// Feeding the data in several pieces produces the same result as a single call
/// to [`crc32`] over the concatenation.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    register: u32,
}

impl Crc32 {
    /// Create a hasher with the register preset to all ones.
    pub const fn new() -> Self {
        Self {
            register: 0xffff_ffff,
        }
    }

    /// Feed `data` into the hasher.
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.register;

        for &byte in data {
            // Low nibble first, then the high nibble.
            crc = (crc >> 4) ^ CRC32_NIBBLE_TABLE[((crc ^ byte as u32) & 0x0f) as usize];
            crc = (crc >> 4) ^ CRC32_NIBBLE_TABLE[((crc ^ (byte >> 4) as u32) & 0x0f) as usize];
        }

        self.register = crc;
    }

    /// Return the checksum of everything fed so far.
    pub const fn finalize(&self) -> u32 {
        !self.register
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

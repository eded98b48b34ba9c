//! Alternate stream cipher, only used by one FPGA image.

use crate::u16::{bit, bitswap};

const KEY_STATE_ORDER: [usize; 16] = [
    13, 11, 9, 7,
    5, 3, 1, 15,
    14, 12, 10, 8,
    6, 4, 2, 0
];

/// Expand key1 into the 16-byte key table.
fn key_table(key1: u16) -> [u8; 16] {
    let mut key = [0; 16];
    let mut key_state = bitswap(key1, KEY_STATE_ORDER);
    for i in 0..8 {
        key[i * 2] = key_state as u8;
        key[i * 2 + 1] = (key_state >> 8) as u8;
        // Each byte rotates left independently.
        key_state = ((key_state & 0x8080) >> 7) | ((key_state & 0x7F7F) << 1);
    }
    key
}

/// Decrypt a single word.
///
/// Only the counter key advances, so it is the only key returned.
pub fn decrypt(data: u16, key1: u16, key3: u8) -> (u16, u8) {
    let key = key_table(key1);
    let key_byte = key[(key3 & 15) as usize];
    let scramble_byte = key[(key3.wrapping_sub(1) & 15) as usize];

    let mut out = 0;
    for cur_bit in 0..8 {
        let mut even = bit(data, cur_bit * 2);
        let mut odd = bit(data, cur_bit * 2 + 1);
        if (scramble_byte >> cur_bit) & 1 != 0 {
            std::mem::swap(&mut even, &mut odd);
        }
        let key_bit = ((key_byte >> cur_bit) & 1) as u16;
        out |= (even ^ key_bit) << (cur_bit * 2);
        out |= odd << (cur_bit * 2 + 1);
    }

    (out, key3.wrapping_add(1))
}

#[cfg(test)]
mod tests {
    use super::{decrypt, key_table};

    #[test]
    fn zero_key_is_identity() {
        assert_eq!(decrypt(0x1234, 0, 0), (0x1234, 1));
        assert_eq!(decrypt(0xFFFF, 0, 7), (0xFFFF, 8));
    }

    #[test]
    fn full_key() {
        // Every pair swaps, then every even bit flips.
        assert_eq!(decrypt(0x0000, 0xFFFF, 0).0, 0x5555);
        // The set even bit moves to odd, and the flip sets even again.
        assert_eq!(decrypt(0x0001, 0xFFFF, 0).0, 0x5557);
    }

    #[test]
    fn table_rotates_per_byte() {
        // Key1 bit 15 lands on key state bit 8.
        let key = key_table(0x8000);
        assert_eq!(key, [
            0x00, 0x01, 0x00, 0x02, 0x00, 0x04, 0x00, 0x08,
            0x00, 0x10, 0x00, 0x20, 0x00, 0x40, 0x00, 0x80
        ]);
    }

    #[test]
    fn counter_selects_key_bytes() {
        // key3 = 0 scrambles with key[15] = 0x80 (top pair) and keys with key[0] = 0.
        assert_eq!(decrypt(0x8000, 0x8000, 0), (0x4000, 1));
        // key3 = 1 keys with key[1] = 0x01 and scrambles with key[0] = 0.
        assert_eq!(decrypt(0x0000, 0x8000, 1), (0x0001, 2));
    }
}

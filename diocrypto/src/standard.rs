//! Default stream cipher, used by every standard FPGA image.

use crate::u16::{bit, bitswap};

/// Control bit of key1^key2 that swaps each output bit pair (bit 2j, bit 2j+1).
const PAIR_SWAP_BITS: [usize; 8] = [0x2, 0x3, 0x5, 0x8, 0x9, 0xB, 0xE, 0xF];

/// Bit of key1^key2 that is XORed into each even output bit (bit 2j).
const EVEN_XOR_BITS: [usize; 8] = [0x0, 0x1, 0x4, 0x6, 0x7, 0xA, 0xC, 0xD];

/// Spreads the 8-bit counter key across a full word.
const COUNTER_SPREAD: [usize; 16] = [
    7, 0, 6, 1,
    5, 2, 4, 3,
    3, 4, 2, 5,
    1, 6, 0, 7
];

/// Decrypt a single word.
///
/// Returns the decrypted word and the updated keys (key1, key2, key3).
pub fn decrypt(data: u16, key1: u16, key2: u16, key3: u8) -> (u16, u16, u16, u8) {
    let m = key1 ^ key2;

    let mut out = 0;
    for (j, swap_bit) in PAIR_SWAP_BITS.iter().enumerate() {
        let lo = bit(data, 2 * j);
        let hi = bit(data, 2 * j + 1);
        let (lo, hi) = if bit(m, *swap_bit) == 1 { (hi, lo) } else { (lo, hi) };
        out |= (lo << (2 * j)) | (hi << (2 * j + 1));
    }

    for (j, xor_bit) in EVEN_XOR_BITS.iter().enumerate() {
        out ^= bit(m, *xor_bit) << (2 * j);
    }

    out ^= bitswap(key3 as u16, COUNTER_SPREAD);

    // Low 15 bits of key1 rotate, top bit is fixed.
    let key1_out = (key1 & 0x8000) | ((key1 << 1) & 0x7FFE) | ((key1 >> 14) & 1);
    let key2_out = if ((key1_out >> 15) ^ key1_out) & 1 != 0 {
        key2.rotate_left(1)
    } else {
        key2
    };

    (out, key1_out, key2_out, key3.wrapping_add(1))
}

#[cfg(test)]
mod tests {
    use super::decrypt;

    #[test]
    fn zero_keys() {
        assert_eq!(decrypt(0x0000, 0, 0, 0), (0x0000, 0, 0, 1));
        assert_eq!(decrypt(0x0001, 0, 0, 0), (0x0001, 0, 0, 1));
        // Counter bit 0 lands on output bits 14 and 1.
        assert_eq!(decrypt(0x0000, 0, 0, 1), (0x4002, 0, 0, 2));
    }

    #[test]
    fn pair_swap() {
        // Bit 2 of the key mask swaps the lowest pair.
        let (out, key1, key2, key3) = decrypt(0x0001, 0x0004, 0, 0);
        assert_eq!(out, 0x0002);
        assert_eq!(key1, 0x0008);
        assert_eq!(key2, 0);
        assert_eq!(key3, 1);
    }

    #[test]
    fn even_xor() {
        // Bit 0xD of the key mask flips output bit 14.
        let (out, ..) = decrypt(0x0000, 0x2000, 0, 0);
        assert_eq!(out, 0x4000);
    }

    #[test]
    fn key_rotation() {
        // Bit 14 wraps to bit 0, which differs from bit 15: key2 rotates.
        let (_, key1, key2, _) = decrypt(0x0000, 0x4000, 0x8001, 0);
        assert_eq!(key1, 0x0001);
        assert_eq!(key2, 0x0003);

        // Top bit of key1 never moves.
        let (_, key1, key2, _) = decrypt(0x0000, 0x8000, 0x8001, 0);
        assert_eq!(key1, 0x8000);
        assert_eq!(key2, 0x0003);
    }

    #[test]
    fn counter_wraps() {
        let (_, _, _, key3) = decrypt(0x0000, 0, 0, 0xFF);
        assert_eq!(key3, 0);
    }
}

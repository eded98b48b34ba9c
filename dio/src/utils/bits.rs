//! Bit and halfword helpers for register decoding.

pub mod u16 {
    /// Mask with only bit `n` set.
    pub const fn bit(n: usize) -> u16 {
        1 << n
    }

    /// Mask from bit `bottom` up to and including bit `top`.
    pub const fn bits(bottom: usize, top: usize) -> u16 {
        let all: u16 = !0;
        (all >> (15 - top)) & (all << bottom)
    }

    pub const fn test_bit(val: u16, n: usize) -> bool {
        (val >> n) & 1 == 1
    }

    /// A line level placed at bit `n`.
    pub const fn from_bool(state: bool, n: usize) -> u16 {
        (state as u16) << n
    }
}

/// Addresses and counters wider than a register are accessed in halves.
pub mod u32 {
    pub const fn lo(val: u32) -> u16 {
        val as u16
    }

    pub const fn hi(val: u32) -> u16 {
        (val >> 16) as u16
    }

    pub const fn set_lo(val: u32, lo: u16) -> u32 {
        (val & !0xFFFF) | (lo as u32)
    }

    pub const fn set_hi(val: u32, hi: u16) -> u32 {
        (val & 0xFFFF) | ((hi as u32) << 16)
    }
}

#[cfg(test)]
mod tests {
    use super::{u16, u32};

    #[test]
    fn masks() {
        assert_eq!(u16::bits(0, 11), 0x0FFF);
        assert_eq!(u16::bits(13, 14), 0x6000);
        assert_eq!(u16::bits(0, 15), 0xFFFF);
        assert_eq!(u16::bits(15, 15), u16::bit(15));
        assert!(u16::test_bit(0x1000, 12));
        assert!(!u16::test_bit(0xEFFF, 12));
        assert_eq!(u16::from_bool(true, 13) | u16::from_bool(false, 12), 0x2000);
    }

    #[test]
    fn halves() {
        assert_eq!(u32::lo(0x01FF_FFFE), 0xFFFE);
        assert_eq!(u32::hi(0x01FF_FFFE), 0x01FF);
        assert_eq!(u32::set_lo(0x0123_4567, 0xABCD), 0x0123_ABCD);
        assert_eq!(u32::set_hi(0x0123_4567, 0xABCD), 0xABCD_4567);
    }
}

/// Extract the nth bit as 0 or 1.
#[inline]
pub const fn bit(val: u16, n: usize) -> u16 {
    (val >> n) & 1
}

/// Build a new value from the source bits listed.
///
/// The first entry is the source of output bit 15,
/// the last entry is the source of output bit 0.
#[inline]
pub const fn bitswap(val: u16, sources: [usize; 16]) -> u16 {
    let mut out = 0;
    let mut i = 0;
    while i < 16 {
        out |= bit(val, sources[i]) << (15 - i);
        i += 1;
    }
    out
}

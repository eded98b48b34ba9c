//! Discrete output latches.
//!
//! Each register takes a nibble from bits 12-15. Lines are numbered
//! `4 * latch + n`, where line n reads the latch bit at `SHIFT[n]`.

use crate::devices::OutputLines;

pub const OUTPUT_LATCHES: usize = 8;

const SHIFT: [usize; 4] = [0, 2, 3, 1];

pub struct OutputBank {
    latches: [u8; OUTPUT_LATCHES],
}

impl OutputBank {
    pub fn new() -> Self {
        Self {
            latches: [0; OUTPUT_LATCHES],
        }
    }

    /// Clear all latches without reporting edges.
    pub fn reset(&mut self) {
        self.latches = [0; OUTPUT_LATCHES];
    }

    pub fn latch(&self, index: usize) -> Option<u8> {
        self.latches.get(index).copied()
    }

    pub fn write<O: OutputLines>(&mut self, index: usize, data: u16, lines: &mut O) {
        let data = ((data >> 12) & 0xF) as u8;
        let old = self.latches[index];

        for (n, shift) in SHIFT.iter().enumerate() {
            let old_bit = (old >> shift) & 1;
            let new_bit = (data >> shift) & 1;
            if old_bit != new_bit {
                lines.set_line((4 * index + n) as u8, new_bit != 0);
            }
        }

        self.latches[index] = data;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::OutputLog;

    #[test]
    fn edges_only() {
        let mut bank = OutputBank::new();
        let mut log = OutputLog::default();
        bank.write(0, 0x1000, &mut log);
        assert_eq!(log.0, vec![(0, true)]);
        bank.write(0, 0x1FFF, &mut log);
        assert_eq!(log.0.len(), 1);
        assert_eq!(bank.latch(0), Some(0x1));
    }

    #[test]
    fn line_order() {
        let mut bank = OutputBank::new();
        let mut log = OutputLog::default();
        // Latch bit 1 is reported as line n=3, bit 2 as n=1.
        bank.write(2, 0x2000, &mut log);
        bank.write(2, 0x4000, &mut log);
        assert_eq!(log.0, vec![(11, true), (9, true), (11, false)]);
    }

    #[test]
    fn all_lines_of_last_latch() {
        let mut bank = OutputBank::new();
        let mut log = OutputLog::default();
        bank.write(7, 0xF000, &mut log);
        assert_eq!(log.0, vec![(28, true), (29, true), (30, true), (31, true)]);
        bank.reset();
        assert_eq!(bank.latch(7), Some(0));
        assert_eq!(bank.latch(8), None);
        assert_eq!(log.0.len(), 4);
    }

    #[test]
    fn closure_lines() {
        let mut bank = OutputBank::new();
        let mut seen = Vec::new();
        bank.write(1, 0x8000, &mut |line: u8, state: bool| seen.push((line, state)));
        assert_eq!(seen, vec![(6, true)]);
    }
}

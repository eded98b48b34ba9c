//! Bridge to the silicon serial number chip.

use crate::devices::IdentityChip;
use crate::utils::{
    bits::u16,
    meminterface::Access,
};

/// Another device can sit on bit 8, but it's unpopulated. Its line reads high.
const UNPOPULATED_LINE: u16 = u16::bit(8);

#[derive(Default)]
pub struct DigitalId {
    cached: u16,
}

impl DigitalId {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.cached = 0;
    }

    pub fn read<I: IdentityChip>(&mut self, chip: &mut I, access: Access) -> u16 {
        if access.has_side_effects() {
            self.cached = u16::from_bool(chip.read(), 12) | UNPOPULATED_LINE;
        }
        self.cached
    }

    /// The line is driven inverted.
    pub fn write<I: IdentityChip>(&mut self, chip: &mut I, data: u16) {
        chip.write(!u16::test_bit(data, 12));
    }
}

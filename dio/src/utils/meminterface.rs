//! Memory interface helpers.

/// How a read reaches a device.
///
/// Debuggers and tracers use `Inspect`, which must not change any state:
/// cursors don't advance, latches don't latch, queues don't pop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Access {
    Normal,
    Inspect,
}

impl Access {
    #[inline]
    pub fn has_side_effects(self) -> bool {
        self == Access::Normal
    }
}

/// Use this for devices with a 16-bit register file.
///
/// Addresses are byte offsets. Ensure that all accesses are aligned.
pub trait MemInterface16 {
    fn read_halfword_with(&mut self, addr: u32, access: Access) -> u16;
    fn write_halfword(&mut self, addr: u32, data: u16);

    fn read_halfword(&mut self, addr: u32) -> u16 {
        self.read_halfword_with(addr, Access::Normal)
    }

    /// Read without side effects.
    fn inspect_halfword(&mut self, addr: u32) -> u16 {
        self.read_halfword_with(addr, Access::Inspect)
    }
}

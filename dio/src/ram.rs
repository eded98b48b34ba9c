//! Board RAM, reached through an address window.
//!
//! The host sets a write or read address, then streams words through the
//! data register. Both cursors auto-increment. Reads past the end of RAM
//! return whatever was last read from a valid address.

use crate::utils::{
    bits::u32,
    meminterface::Access,
};

/// 25-bit byte address, always halfword aligned.
pub const RAM_ADDR_MASK: u32 = 0x1FF_FFFE;

/// 24MiB of DRAM.
pub const DEFAULT_RAM_WORDS: usize = 0xC0_0000;

/// Power-on contents alternate between blocks of 0xFFFF and 0x0000.
const FILL_BLOCK_WORDS: usize = 0x800;

pub struct WindowRAM {
    data:               Vec<u16>,
    write_addr:         u32,
    read_addr:          u32,
    last_valid_read:    u16,
    enabled:            bool,
}

impl WindowRAM {
    pub fn new(words: usize) -> Self {
        let data = (0..words)
            .map(|i| if (i / FILL_BLOCK_WORDS) % 2 == 0 {0xFFFF} else {0x0000})
            .collect();
        Self {
            data:               data,
            write_addr:         0,
            read_addr:          0,
            last_valid_read:    0,
            enabled:            false,
        }
    }

    /// Length in words.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Reset cursors and access. Contents survive.
    pub fn reset(&mut self) {
        self.write_addr = 0;
        self.read_addr = 0;
        self.last_valid_read = 0;
        self.enabled = false;
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn write_addr(&self) -> u32 {
        self.write_addr
    }

    pub fn read_addr(&self) -> u32 {
        self.read_addr
    }

    pub fn last_valid_read(&self) -> u16 {
        self.last_valid_read
    }

    /// Word at a byte address, if it exists.
    pub fn fetch(&self, addr: u32) -> Option<u16> {
        self.data.get(((addr & RAM_ADDR_MASK) >> 1) as usize).copied()
    }

    pub fn set_write_addr_hi(&mut self, data: u16) {
        self.write_addr = u32::set_hi(self.write_addr, data) & RAM_ADDR_MASK;
    }

    pub fn set_write_addr_lo(&mut self, data: u16) {
        self.write_addr = u32::set_lo(self.write_addr, data) & RAM_ADDR_MASK;
    }

    // Moving the read cursor refreshes the last valid read, moving the write cursor doesn't.
    pub fn set_read_addr_hi(&mut self, data: u16) {
        self.read_addr = u32::set_hi(self.read_addr, data) & RAM_ADDR_MASK;
        self.last_valid_read = self.next_value();
    }

    pub fn set_read_addr_lo(&mut self, data: u16) {
        self.read_addr = u32::set_lo(self.read_addr, data) & RAM_ADDR_MASK;
        self.last_valid_read = self.next_value();
    }

    /// Look at the word under the read cursor.
    pub fn peek(&self) -> u16 {
        if !self.enabled {
            return self.last_valid_read;
        }
        self.next_value()
    }

    pub fn read(&mut self, access: Access) -> u16 {
        if !self.enabled {
            return self.last_valid_read;
        }

        let data = self.next_value();
        if access.has_side_effects() {
            self.last_valid_read = data;
            self.read_addr = (self.read_addr + 2) & RAM_ADDR_MASK;
            self.last_valid_read = self.next_value();
        }
        data
    }

    pub fn write(&mut self, data: u16) {
        if !self.enabled {
            return;
        }

        let index = (self.write_addr >> 1) as usize;
        if let Some(word) = self.data.get_mut(index) {
            *word = data;
        }
        self.write_addr = (self.write_addr + 2) & RAM_ADDR_MASK;
    }
}

// Internal
impl WindowRAM {
    fn next_value(&self) -> u16 {
        self.fetch(self.read_addr).unwrap_or(self.last_valid_read)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enabled_ram(words: usize) -> WindowRAM {
        let mut ram = WindowRAM::new(words);
        ram.set_enabled(true);
        ram
    }

    #[test]
    fn power_on_pattern() {
        let ram = WindowRAM::new(0x2000);
        assert_eq!(ram.fetch(0), Some(0xFFFF));
        assert_eq!(ram.fetch(0xFFE), Some(0xFFFF));
        assert_eq!(ram.fetch(0x1000), Some(0x0000));
        assert_eq!(ram.fetch(0x2000), Some(0xFFFF));
        assert_eq!(ram.fetch(0x4000), None);
    }

    #[test]
    fn write_then_read() {
        let mut ram = enabled_ram(0x100);
        ram.set_write_addr_hi(0);
        ram.set_write_addr_lo(0x10);
        ram.write(0x1234);
        ram.write(0x5678);
        assert_eq!(ram.write_addr(), 0x14);

        ram.set_read_addr_hi(0);
        ram.set_read_addr_lo(0x10);
        assert_eq!(ram.last_valid_read(), 0x1234);
        assert_eq!(ram.read(Access::Normal), 0x1234);
        assert_eq!(ram.last_valid_read(), 0x5678);
        assert_eq!(ram.read(Access::Normal), 0x5678);
        assert_eq!(ram.read_addr(), 0x14);
    }

    #[test]
    fn cursors_are_independent() {
        let mut ram = enabled_ram(0x100);
        ram.set_read_addr_lo(0x20);
        ram.set_write_addr_lo(0x40);
        ram.write(0xAAAA);
        assert_eq!(ram.read_addr(), 0x20);
        assert_eq!(ram.write_addr(), 0x42);
    }

    #[test]
    fn address_mask() {
        let mut ram = enabled_ram(0x100);
        ram.set_write_addr_hi(0xFFFF);
        ram.set_write_addr_lo(0xFFFF);
        assert_eq!(ram.write_addr(), 0x1FF_FFFE);

        ram.set_read_addr_lo(0x0003);
        assert_eq!(ram.read_addr(), 0x0002);

        // Increment wraps at the top of the window.
        ram.set_write_addr_lo(0xFFFE);
        ram.write(0);
        assert_eq!(ram.write_addr(), 0);
    }

    #[test]
    fn write_cursor_leaves_last_valid() {
        let mut ram = enabled_ram(0x100);
        ram.set_write_addr_lo(0);
        ram.write(0x1234);
        ram.set_read_addr_lo(0);
        assert_eq!(ram.last_valid_read(), 0x1234);

        ram.set_write_addr_lo(0);
        ram.write(0x5678);
        assert_eq!(ram.last_valid_read(), 0x1234);
        assert_eq!(ram.peek(), 0x5678);
    }

    #[test]
    fn out_of_range_reads_stale() {
        let mut ram = enabled_ram(0x10);
        ram.set_write_addr_lo(0x1E);
        ram.write(0xBEEF);

        ram.set_read_addr_lo(0x1E);
        assert_eq!(ram.read(Access::Normal), 0xBEEF);
        // Now past the end.
        assert_eq!(ram.read_addr(), 0x20);
        assert_eq!(ram.read(Access::Normal), 0xBEEF);
        assert_eq!(ram.peek(), 0xBEEF);

        // Writes past the end are dropped but still advance.
        ram.set_write_addr_lo(0x30);
        ram.write(0x1111);
        assert_eq!(ram.write_addr(), 0x32);
        assert_eq!(ram.fetch(0x30), None);
    }

    #[test]
    fn inspect_has_no_side_effects() {
        let mut ram = enabled_ram(0x100);
        ram.set_write_addr_lo(0);
        ram.write(0x0102);
        ram.write(0x0304);
        ram.set_read_addr_lo(0);

        assert_eq!(ram.read(Access::Inspect), 0x0102);
        assert_eq!(ram.read(Access::Inspect), 0x0102);
        assert_eq!(ram.read_addr(), 0);
        assert_eq!(ram.peek(), 0x0102);
        assert_eq!(ram.read_addr(), 0);
    }

    #[test]
    fn disabled_access() {
        let mut ram = enabled_ram(0x100);
        ram.set_read_addr_lo(0x1000);
        ram.set_enabled(false);

        ram.set_write_addr_lo(0);
        ram.write(0x1234);
        assert_eq!(ram.write_addr(), 0);
        assert_eq!(ram.fetch(0), Some(0xFFFF));

        ram.set_read_addr_lo(0);
        assert_eq!(ram.read(Access::Normal), 0xFFFF);
        assert_eq!(ram.read_addr(), 0);
        assert_eq!(ram.peek(), 0xFFFF);
    }
}

//! Chips and lines the board drives but doesn't own.

use bitflags::bitflags;

bitflags! {
    pub struct AudioChannels: u8 {
        const LEFT  = 1 << 0;
        const RIGHT = 1 << 1;
        const ALL   = Self::LEFT.bits | Self::RIGHT.bits;
    }
}

/// MPEG audio decoder fed by the board.
///
/// The decoder reports back through the board's `mpeg_*` callbacks.
pub trait Mp3Decoder {
    /// Serial input: one byte of the compressed stream.
    fn sid_write(&mut self, data: u8);

    /// Drop any partially decoded frame.
    fn reset_mpeg_state(&mut self);

    fn set_output_gain(&mut self, channels: AudioChannels, gain: f32);

    /// I2C clock line. Pulled high if the decoder doesn't drive it.
    fn i2c_scl(&self) -> bool {
        true
    }

    /// I2C data line. Pulled high if the decoder doesn't drive it.
    fn i2c_sda(&self) -> bool {
        true
    }

    fn write_i2c(&mut self, _scl: bool, _sda: bool) {}
}

/// Single-wire silicon serial number.
pub trait IdentityChip {
    fn read(&mut self) -> bool;
    fn write(&mut self, state: bool);
}

/// Discrete output lines 0-31.
pub trait OutputLines {
    fn set_line(&mut self, line: u8, state: bool);
}

impl<F: FnMut(u8, bool)> OutputLines for F {
    fn set_line(&mut self, line: u8, state: bool) {
        self(line, state)
    }
}

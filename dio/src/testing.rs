//! Recording stand-ins for the chips around the board.

use crate::devices::{AudioChannels, IdentityChip, Mp3Decoder, OutputLines};

#[derive(Default)]
pub struct FakeDecoder {
    pub bytes:          Vec<u8>,
    pub resets:         usize,
    pub gains:          Vec<(AudioChannels, f32)>,
    pub scl:            bool,
    pub sda:            bool,
}

impl Mp3Decoder for FakeDecoder {
    fn sid_write(&mut self, data: u8) {
        self.bytes.push(data);
    }

    fn reset_mpeg_state(&mut self) {
        self.resets += 1;
    }

    fn set_output_gain(&mut self, channels: AudioChannels, gain: f32) {
        self.gains.push((channels, gain));
    }

    fn i2c_scl(&self) -> bool {
        self.scl
    }

    fn i2c_sda(&self) -> bool {
        self.sda
    }

    fn write_i2c(&mut self, scl: bool, sda: bool) {
        self.scl = scl;
        self.sda = sda;
    }
}

#[derive(Default)]
pub struct FakeIdentity {
    pub line:       bool,
    pub reads:      usize,
    pub writes:     Vec<bool>,
}

impl IdentityChip for FakeIdentity {
    fn read(&mut self) -> bool {
        self.reads += 1;
        self.line
    }

    fn write(&mut self, state: bool) {
        self.writes.push(state);
    }
}

#[derive(Default)]
pub struct OutputLog(pub Vec<(u8, bool)>);

impl OutputLines for OutputLog {
    fn set_line(&mut self, line: u8, state: bool) {
        self.0.push((line, state));
    }
}

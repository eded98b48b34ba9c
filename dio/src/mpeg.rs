//! MPEG transfer engine.
//!
//! Streams encrypted MP3 data out of board RAM, one byte per transfer,
//! into the decoder while it asserts demand. Also counts decoded frames
//! and samples for the host to sync against.

use bitflags::bitflags;
use log::{debug, trace};

use diocrypto::{CipherState, CipherVariant};
use crate::devices::Mp3Decoder;
use crate::ram::{WindowRAM, RAM_ADDR_MASK};
use crate::utils::{
    bits::{u16, u32},
    meminterface::Access,
};

/// Timer high register on firmware that doesn't implement it.
const TIMER_HI_PLACEHOLDER: u16 = 0x7654;

bitflags! {
    #[derive(Default)]
    pub struct MpegControl: u16 {
        const FRAME_COUNTER_ENABLE  = u16::bit(15);
        const STREAMING_ENABLE      = u16::bit(14);
        const MPEG_ENABLE           = u16::bit(13);
        const UNUSED                = u16::bits(0, 12);

        const PLAYBACK              = u16::bit(13) | u16::bit(14);
    }
}

bitflags! {
    #[derive(Default)]
    pub struct PlaybackStatus: u16 {
        const ENABLED   = u16::bit(15);
        const PLAYING   = u16::bit(14);
        const CRC_ERROR = u16::bit(13);
        const DEMAND    = u16::bit(12);
    }
}

pub struct Mpeg {
    current_addr:   u32,
    end_addr:       u32,

    cipher:         CipherState,

    control:        MpegControl,
    status:         PlaybackStatus,
    frame_counter:  u16,
    has_ended:      bool,
    timer_enabled:  bool,

    /// Decrypted word, sent low byte first.
    mp3_data:       u16,
    remaining_bytes: u8,

    sample_counter:         u32,
    sample_counter_last:    u32,
}

impl Mpeg {
    pub fn new() -> Self {
        Self {
            current_addr:   0,
            end_addr:       0,

            cipher:         CipherState::default(),

            control:        MpegControl::default(),
            status:         PlaybackStatus::CRC_ERROR,
            frame_counter:  0,
            has_ended:      false,
            timer_enabled:  true,

            mp3_data:       0,
            remaining_bytes: 0,

            sample_counter:         0,
            sample_counter_last:    0,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Set by the loaded FPGA program.
    pub fn set_variant(&mut self, variant: CipherVariant) {
        self.cipher.variant = variant;
    }

    pub fn cipher(&self) -> &CipherState {
        &self.cipher
    }

    pub fn has_ended(&self) -> bool {
        self.has_ended
    }

    pub fn sample_counter(&self) -> u32 {
        self.sample_counter
    }

    fn is_alternate(&self) -> bool {
        self.cipher.variant == CipherVariant::Alternate
    }

    /// Streaming is enabled and there is still data to send.
    pub fn is_streaming(&self) -> bool {
        self.control.contains(MpegControl::STREAMING_ENABLE)
            && (self.current_addr != self.end_addr || self.remaining_bytes != 0)
            && !self.has_ended
    }
}

// Registers
impl Mpeg {
    pub fn write_current_addr_hi(&mut self, data: u16) {
        self.current_addr = u32::set_hi(self.current_addr, data) & RAM_ADDR_MASK;
        debug!("MPEG start address high {:04x} ({:08x})", data, self.current_addr);
    }

    pub fn write_current_addr_lo(&mut self, data: u16) {
        self.current_addr = u32::set_lo(self.current_addr, data) & RAM_ADDR_MASK;
        debug!("MPEG start address low {:04x} ({:08x})", data, self.current_addr);
    }

    pub fn write_end_addr_hi(&mut self, data: u16) {
        self.end_addr = u32::set_hi(self.end_addr, data) & RAM_ADDR_MASK;
        debug!("MPEG end address high {:04x} ({:08x})", data, self.end_addr);
    }

    pub fn write_end_addr_lo(&mut self, data: u16) {
        self.end_addr = u32::set_lo(self.end_addr, data) & RAM_ADDR_MASK;
        debug!("MPEG end address low {:04x} ({:08x})", data, self.end_addr);
    }

    pub fn read_current_addr_hi(&self) -> u16 {
        u32::hi(self.current_addr)
    }

    pub fn read_current_addr_lo(&self) -> u16 {
        u32::lo(self.current_addr)
    }

    pub fn write_key1(&mut self, data: u16) {
        debug!("MPEG key 1/3 {:04x}", data);
        self.cipher.key1 = data;
        if self.is_alternate() {
            self.cipher.key3 = 0;
        }
    }

    pub fn write_key2(&mut self, data: u16) {
        if self.is_alternate() {
            return;
        }
        debug!("MPEG key 2/3 {:04x}", data);
        self.cipher.key2 = data;
    }

    pub fn write_key3(&mut self, data: u16) {
        if self.is_alternate() {
            return;
        }
        debug!("MPEG key 3/3 {:04x}", data);
        self.cipher.key3 = data as u8;
    }

    pub fn read_frame_counter(&self) -> u16 {
        self.frame_counter
    }

    // TODO: find out what clears ENABLED on hardware.
    pub fn read_status(&self) -> u16 {
        (self.status | PlaybackStatus::ENABLED).bits()
    }

    pub fn read_control(&self) -> u16 {
        (self.is_streaming() as u16) << 12
    }

    pub fn write_control<D: Mp3Decoder>(&mut self, data: u16, decoder: &mut D) {
        let new_control = MpegControl::from_bits_truncate(data);
        debug!("MPEG control {}{}{} | {:04x}",
            if new_control.contains(MpegControl::FRAME_COUNTER_ENABLE) {'#'} else {'.'},
            if new_control.contains(MpegControl::STREAMING_ENABLE) {'#'} else {'.'},
            if new_control.contains(MpegControl::MPEG_ENABLE) {'#'} else {'.'},
            data
        );

        if self.control.contains(MpegControl::FRAME_COUNTER_ENABLE) && !new_control.contains(MpegControl::FRAME_COUNTER_ENABLE) {
            self.frame_counter = 0;
        }

        // Both flags rising together restarts the sample timer.
        // The alternate firmware keeps counting.
        if !self.is_alternate()
            && new_control.contains(MpegControl::PLAYBACK)
            && !self.control.contains(MpegControl::PLAYBACK) {
            self.sample_counter = 0;
            self.sample_counter_last = 0;
        }

        let falling = self.control & !new_control;
        if self.has_ended && falling.intersects(MpegControl::PLAYBACK) {
            self.has_ended = false;
            decoder.reset_mpeg_state();
        }

        self.control = new_control;
    }

    pub fn read_timer_hi(&mut self, access: Access) -> u16 {
        if self.is_alternate() {
            return TIMER_HI_PLACEHOLDER;
        }
        if access.has_side_effects() {
            self.sample_counter_last = self.sample_counter;
        }
        u32::hi(self.sample_counter)
    }

    pub fn read_timer_lo(&mut self, access: Access) -> u16 {
        if access.has_side_effects() {
            self.sample_counter_last = self.sample_counter;
        }
        u32::lo(self.sample_counter)
    }

    /// The first read after a latch shows the full difference, then the
    /// low halves are cleared for later reads.
    pub fn read_timer_diff(&mut self, access: Access) -> u16 {
        let diff = self.sample_counter.wrapping_sub(self.sample_counter_last) as u16;
        if access.has_side_effects() {
            self.sample_counter &= 0xFFFF_0000;
            self.sample_counter_last &= 0xFFFF_0000;
        }
        diff
    }

    /// Any write resets the sample timer.
    pub fn write_timer_lo(&mut self) {
        self.sample_counter = 0;
        self.sample_counter_last = 0;

        // The alternate firmware doesn't stop the timer when nothing is streaming.
        if !self.is_alternate() {
            self.timer_enabled = self.is_streaming();
        }
    }
}

// Transfer
impl Mpeg {
    /// Send one byte to the decoder.
    ///
    /// `fetch_enabled` gates reads from RAM; a disabled fetch feeds zeroes.
    pub fn transfer<D: Mp3Decoder>(&mut self, ram: &WindowRAM, fetch_enabled: bool, decoder: &mut D) {
        if !self.has_ended
            && self.control.contains(MpegControl::STREAMING_ENABLE)
            && self.current_addr == self.end_addr
            && self.remaining_bytes == 0 {
            debug!("MPEG stream ended at {:08x}", self.current_addr);
            self.has_ended = true;
            self.control.remove(MpegControl::STREAMING_ENABLE);
        }

        if !self.status.contains(PlaybackStatus::DEMAND)
            || !self.control.contains(MpegControl::PLAYBACK)
            || self.has_ended {
            return;
        }

        if self.remaining_bytes == 0 {
            let src = if fetch_enabled {
                ram.fetch(self.current_addr).unwrap_or(0)
            } else {
                0
            };
            self.mp3_data = self.cipher.advance(src).swap_bytes();
            self.current_addr = (self.current_addr + 2) & RAM_ADDR_MASK;
            self.remaining_bytes = 2;
        }

        let data = self.mp3_data as u8;
        trace!("MPEG send {:02x}", data);
        decoder.sid_write(data);
        self.mp3_data >>= 8;
        self.remaining_bytes -= 1;
    }
}

// Decoder callbacks
impl Mpeg {
    pub fn frame_sync(&mut self, state: bool) {
        self.status.set(PlaybackStatus::PLAYING, state);

        if state && self.control.contains(MpegControl::FRAME_COUNTER_ENABLE) {
            if self.frame_counter == 0 {
                self.timer_enabled = true;
            }
            self.frame_counter = self.frame_counter.wrapping_add(1);
        }
    }

    /// Returns the new demand level if it changed.
    pub fn demand(&mut self, state: bool) -> Option<bool> {
        let prev = self.status.contains(PlaybackStatus::DEMAND);
        self.status.set(PlaybackStatus::DEMAND, state);
        if prev != state {
            Some(state)
        } else {
            None
        }
    }

    /// Set when the MP3 is corrupt or there's nothing to decode.
    pub fn crc_error(&mut self, state: bool) {
        self.status.set(PlaybackStatus::CRC_ERROR, state);
    }

    /// Marks each left/right sample in the decoder's I2S output.
    pub fn frame_identification(&mut self, state: bool, dac_output_enabled: bool) {
        if dac_output_enabled && self.timer_enabled && state {
            self.sample_counter = self.sample_counter.wrapping_add(1);
        }
    }
}

//! The digital I/O board.
//!
//! Sits on the host's expansion bus as a bank of 16-bit registers.
//! Everything except the FPGA status and program registers is dead
//! until a program has been loaded into the FPGA.

mod config;

use bitflags::bitflags;
use log::{debug, info, trace};

use diocrypto::CipherVariant;
use crate::{
    devices::{AudioChannels, IdentityChip, Mp3Decoder, OutputLines},
    digitalid::DigitalId,
    fpga::{self, Fpga, GateState},
    mpeg::Mpeg,
    network::{Network, SerialLink},
    output::OutputBank,
    ram::WindowRAM,
    timers::{Timers, TimerEvents},
    utils::{
        bits::u16,
        meminterface::{Access, MemInterface16},
    },
};

pub use config::{BoardConfig, ConfigError, MAX_RAM_WORDS, DEFAULT_NETWORK_PORTS};

/// Registers are 16 bits wide within a 256-byte window.
const REG_MASK: u32 = 0xFE;

/// Read from any register with nothing behind it while the FPGA is unloaded.
const OPEN_BUS: u16 = 0xFFFF;
/// Unused registers in the 0x80 and 0xD0 ranges.
const UNUSED_READ: u16 = 0x1234;
/// Unused network registers.
const NETWORK_UNUSED_READ: u16 = 0x7654;

/// Status write that begins a program transfer.
const FPGA_START_PROGRAM: u16 = 0x8000;

/// Status reads always reach the FPGA.
const STATUS_REGS: std::ops::RangeInclusive<u32> = 0xF0..=0xFE;

bitflags! {
    #[derive(Default)]
    pub struct DeviceControl: u16 {
        const MAS_POWER     = u16::bit(15);
        const RAM_ENABLE    = u16::bit(14);
        const DAC_OUTPUT    = u16::bit(13);
        const UNUSED        = u16::bits(0, 12);
    }
}

bitflags! {
    #[derive(Default)]
    pub struct RamControl: u16 {
        /// The MPEG engine reads from RAM. Otherwise it streams zeroes.
        const MPEG_FETCH    = u16::bit(15);
        const UNUSED        = u16::bits(0, 14);
    }
}

pub struct DigitalIOBoard<D: Mp3Decoder, I: IdentityChip, O: OutputLines> {
    fpga:           Fpga,
    ram:            WindowRAM,
    mpeg:           Mpeg,
    digital_id:     DigitalId,
    outputs:        OutputBank,
    network:        Network,
    timers:         Timers,

    device_control: DeviceControl,
    ram_control:    RamControl,
    audio_muted:    bool,

    decoder:        D,
    identity:       I,
    output_lines:   O,
}

impl<D: Mp3Decoder, I: IdentityChip, O: OutputLines> DigitalIOBoard<D, I, O> {
    pub fn new(config: &BoardConfig, decoder: D, identity: I, output_lines: O) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut board = Self {
            fpga:           Fpga::new(),
            ram:            WindowRAM::new(config.ram_words),
            mpeg:           Mpeg::new(),
            digital_id:     DigitalId::new(),
            outputs:        OutputBank::new(),
            network:        Network::new(config.network_ports),
            timers:         Timers::new(),

            device_control: DeviceControl::default(),
            ram_control:    RamControl::default(),
            audio_muted:    false,

            decoder:        decoder,
            identity:       identity,
            output_lines:   output_lines,
        };
        board.reset();
        Ok(board)
    }

    /// Power-on reset.
    pub fn reset(&mut self) {
        self.fpga.power_on();
        self.outputs.reset();
        self.reset_components();
    }

    /// Advance the board by `cycles` host clock cycles.
    pub fn clock(&mut self, mut cycles: usize) {
        while cycles > 0 {
            let (elapsed, events) = self.timers.step(cycles);
            cycles -= elapsed;
            if events.contains(TimerEvents::MPEG_TRANSFER) {
                self.mpeg_transfer();
            }
            if events.contains(TimerEvents::NETWORK_PUMP) {
                self.network.pump();
            }
        }
    }

    pub fn gate_open(&self) -> bool {
        self.fpga.is_initialized()
    }

    pub fn gate_state(&self) -> GateState {
        self.fpga.state()
    }

    /// The FPGA program as received so far.
    pub fn fpga_image(&self) -> &[u8] {
        self.fpga.image()
    }

    /// The cipher selected by the loaded program.
    pub fn cipher_variant(&self) -> Option<CipherVariant> {
        self.fpga.variant()
    }

    /// Load an FPGA program through the status and program registers,
    /// the way the host's boot code does.
    pub fn boot(&mut self, image: &[u8]) -> Option<CipherVariant> {
        if self.gate_open() {
            // Clearing the configured bit drops the running program.
            self.write_halfword(0xF6, 0);
        }
        self.write_halfword(0xF6, FPGA_START_PROGRAM);
        for data in fpga::image_bits(image) {
            self.write_halfword(0xF8, data);
        }
        self.cipher_variant()
    }

    /// Mute from outside the board, e.g. the host's sound settings.
    pub fn set_audio_mute(&mut self, muted: bool) {
        self.audio_muted = muted;
        self.update_output_gain();
    }

    pub fn connect_network(&mut self, port: usize, link: Box<dyn SerialLink>) -> Result<(), ConfigError> {
        if port >= self.network.num_ports() {
            return Err(ConfigError::NoSuchPort(port));
        }
        self.network.connect(port, link);
        Ok(())
    }

    pub fn disconnect_network(&mut self, port: usize) -> Option<Box<dyn SerialLink>> {
        self.network.disconnect(port)
    }

    /// True while the decoder is being fed.
    pub fn mpeg_transfer_active(&self) -> bool {
        self.timers.mpeg_running()
    }

    /// Last nibble written to an output bank, if the bank exists.
    pub fn output_latch(&self, index: usize) -> Option<u8> {
        self.outputs.latch(index)
    }

    pub fn network(&self) -> &Network {
        &self.network
    }

    pub fn mpeg(&self) -> &Mpeg {
        &self.mpeg
    }

    pub fn ram(&self) -> &WindowRAM {
        &self.ram
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    pub fn decoder_mut(&mut self) -> &mut D {
        &mut self.decoder
    }

    pub fn identity(&self) -> &I {
        &self.identity
    }

    pub fn output_lines(&self) -> &O {
        &self.output_lines
    }
}

// Decoder callbacks
impl<D: Mp3Decoder, I: IdentityChip, O: OutputLines> DigitalIOBoard<D, I, O> {
    pub fn mpeg_frame_sync(&mut self, state: bool) {
        self.mpeg.frame_sync(state);
    }

    /// The decoder wants data. Transfers start straight away.
    pub fn mpeg_demand(&mut self, state: bool) {
        match self.mpeg.demand(state) {
            Some(true) => {
                self.timers.start_mpeg();
                self.mpeg_transfer();
            },
            Some(false) => self.timers.stop_mpeg(),
            None => {},
        }
    }

    pub fn mpeg_crc_error(&mut self, state: bool) {
        self.mpeg.crc_error(state);
    }

    pub fn mpeg_frame_identification(&mut self, state: bool) {
        let dac_output = self.device_control.contains(DeviceControl::DAC_OUTPUT);
        self.mpeg.frame_identification(state, dac_output);
    }
}

// Internal
impl<D: Mp3Decoder, I: IdentityChip, O: OutputLines> DigitalIOBoard<D, I, O> {
    /// Everything but the FPGA returns to its unloaded state.
    fn reset_components(&mut self) {
        self.ram.reset();
        self.mpeg.reset();
        self.network.clear();
        self.digital_id.reset();
        self.timers.stop_mpeg();

        self.device_control = DeviceControl::default();
        self.ram_control = RamControl::default();
        self.audio_muted = false;
    }

    fn mpeg_transfer(&mut self) {
        let fetch = self.ram_control.contains(RamControl::MPEG_FETCH);
        self.mpeg.transfer(&self.ram, fetch, &mut self.decoder);
    }

    fn update_output_gain(&mut self) {
        let dac_output = self.device_control.contains(DeviceControl::DAC_OUTPUT);
        let gain = if dac_output && !self.audio_muted {1.0} else {0.0};
        self.decoder.set_output_gain(AudioChannels::ALL, gain);
    }

    fn write_device_control(&mut self, data: u16) {
        let control = DeviceControl::from_bits_truncate(data);
        self.ram.set_enabled(control.contains(DeviceControl::RAM_ENABLE));

        let changed = self.device_control ^ control;
        if self.device_control.contains(DeviceControl::MAS_POWER) && !control.contains(DeviceControl::MAS_POWER) {
            debug!("decoder powered down");
        }

        self.device_control = control;
        if changed.contains(DeviceControl::DAC_OUTPUT) {
            self.update_output_gain();
        }
    }

    fn read_i2c(&self) -> u16 {
        u16::from_bool(self.decoder.i2c_scl(), 13) | u16::from_bool(self.decoder.i2c_sda(), 12)
    }

    fn write_output(&mut self, index: usize, data: u16) {
        self.outputs.write(index, data, &mut self.output_lines);
    }
}

impl<D: Mp3Decoder, I: IdentityChip, O: OutputLines> MemInterface16 for DigitalIOBoard<D, I, O> {
    fn read_halfword_with(&mut self, addr: u32, access: Access) -> u16 {
        let addr = addr & REG_MASK;
        if STATUS_REGS.contains(&addr) {
            return self.fpga.read_status();
        }
        if !self.fpga.is_initialized() {
            return OPEN_BUS;
        }

        match addr {
            0x80..=0x9E => UNUSED_READ,

            0xA0 => self.mpeg.read_current_addr_hi(),
            0xA2 => self.mpeg.read_current_addr_lo(),
            0xA4 | 0xA6 | 0xAE => self.mpeg.read_control(),
            0xA8 => self.mpeg.read_frame_counter(),
            0xAA => self.mpeg.read_status(),
            0xAC => self.read_i2c(),

            // Every RAM register shows the next word, but only the data register advances.
            0xB4 => self.ram.read(access),
            0xB0..=0xBE => self.ram.peek(),

            0xC0 => self.network.read(access),
            0xC2 => self.network.output_buffer_size(),
            0xC4 => self.network.input_buffer_size(),
            0xC6 | 0xC8 => NETWORK_UNUSED_READ,
            0xCA => self.mpeg.read_timer_hi(access),
            0xCC => self.mpeg.read_timer_lo(access),
            0xCE => self.mpeg.read_timer_diff(access),

            0xD0..=0xDE => UNUSED_READ,

            0xE0..=0xEE => self.digital_id.read(&mut self.identity, access),

            _ => OPEN_BUS,
        }
    }

    fn write_halfword(&mut self, addr: u32, data: u16) {
        let addr = addr & REG_MASK;
        match addr {
            0xF6 => {
                if self.fpga.write_status(data) {
                    info!("board reset by FPGA unload");
                    self.reset_components();
                }
                return;
            },
            0xF8 => {
                if let Some(variant) = self.fpga.write_firmware(data) {
                    self.mpeg.set_variant(variant);
                }
                return;
            },
            _ => {},
        }

        if !self.fpga.is_initialized() {
            trace!("write {:02x} = {:04x} ignored: FPGA not loaded", addr, data);
            return;
        }

        match addr {
            0x90 => self.network.set_local_id(data),

            0xA0 => self.mpeg.write_current_addr_hi(data),
            0xA2 => self.mpeg.write_current_addr_lo(data),
            0xA4 => self.mpeg.write_end_addr_hi(data),
            0xA6 => self.mpeg.write_end_addr_lo(data),
            0xA8 => self.mpeg.write_key1(data),
            0xAA => debug!("decoder control: {:04x}", data),
            0xAC => self.decoder.write_i2c(u16::test_bit(data, 13), u16::test_bit(data, 12)),
            0xAE => self.mpeg.write_control(data, &mut self.decoder),

            0xB0 => self.ram.set_write_addr_hi(data),
            0xB2 => self.ram.set_write_addr_lo(data),
            0xB4 => self.ram.write(data),
            0xB6 => self.ram.set_read_addr_hi(data),
            0xB8 => self.ram.set_read_addr_lo(data),
            0xBA => self.ram_control = RamControl::from_bits_truncate(data),

            0xC0 => self.network.write(data),
            0xC8 => self.network.reset(),
            0xCC => self.mpeg.write_timer_lo(),

            0xE0 => self.write_output(1, data),
            0xE2 => self.write_output(0, data),
            0xE4 => self.write_output(3, data),
            0xE6 => self.write_output(7, data),
            0xE8 => self.write_device_control(data),
            0xEA => self.mpeg.write_key2(data),
            0xEC => self.mpeg.write_key3(data),
            0xEE => self.digital_id.write(&mut self.identity, data),

            0xFA => self.write_output(4, data),
            0xFC => self.write_output(5, data),
            0xFE => self.write_output(2, data),

            _ => trace!("write {:02x} = {:04x}: no register", addr, data),
        }
    }
}

//! FPGA configuration.
//!
//! Until a complete program has been shifted in, every functional register
//! on the board is dead. The CRC of the program picks the MPEG cipher.

use bitflags::bitflags;
use log::{debug, info};
use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use diocrypto::{crc32, CipherVariant};
use crate::utils::bits::u16;

/// Size of the FPGA program in bytes.
pub const FIRMWARE_SIZE: usize = 41337;
const FIRMWARE_BITS: u32 = (FIRMWARE_SIZE * 8) as u32;

/// Status after power-on.
const POWER_ON_STATUS: u16 = 0x8FFF;

bitflags! {
    #[derive(Default)]
    pub struct FpgaStatus: u16 {
        const READY         = u16::bit(15); // Always set on read.
        const CONFIGURED    = u16::bit(14); // Never set on read.
        const DONE          = u16::bit(13);
        const PROGRAM       = u16::bit(12);
        const PINS          = u16::bits(0, 11);
    }
}

/// Where the board is in the configuration handshake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateState {
    Uninit,
    /// Armed by a status write, no bits received yet.
    PreInit,
    /// Bits are arriving. `pre_init` is false if the program bit was set
    /// without arming, which only happens after a gate-closing reset.
    Loading {
        bits_received:  u32,
        pre_init:       bool,
    },
    Initialized {
        variant: CipherVariant,
    },
}

impl GateState {
    pub fn is_open(self) -> bool {
        matches!(self, GateState::Initialized{..})
    }

    fn is_pre_init(self) -> bool {
        match self {
            GateState::PreInit => true,
            GateState::Loading{pre_init, ..} => pre_init,
            _ => false,
        }
    }

    fn armed(self) -> Self {
        match self {
            GateState::Uninit => GateState::PreInit,
            GateState::Loading{bits_received, ..} => GateState::Loading{bits_received, pre_init: true},
            state => state,
        }
    }

    fn bits_received(self) -> u32 {
        match self {
            GateState::Loading{bits_received, ..} => bits_received,
            GateState::Initialized{..} => FIRMWARE_BITS,
            _ => 0,
        }
    }
}

/// Status write while unconfigured.
///
/// 0x2000 and 0x8000 set the program bit immediately, but 0x1000 and 0x4000
/// only toggle it on the write after the board has been armed.
pub fn handshake(state: GateState, status: FpgaStatus, data: u16) -> (GateState, FpgaStatus) {
    let data = FpgaStatus::from_bits_truncate(data);
    let mut state = state;
    let mut status = status;

    if data.intersects(FpgaStatus::DONE | FpgaStatus::READY) && !state.is_pre_init() {
        status.remove(FpgaStatus::DONE | FpgaStatus::READY);
        status.insert(FpgaStatus::PROGRAM);
        state = state.armed();
    }

    if data.intersects(FpgaStatus::PROGRAM | FpgaStatus::CONFIGURED) {
        if state.is_pre_init() {
            status.toggle(FpgaStatus::PROGRAM);
        } else {
            state = state.armed();
        }
    }

    (state, status)
}

pub struct Fpga {
    status:         FpgaStatus,
    state:          GateState,
    firmware_byte:  u8,
    firmware:       Vec<u8>,
}

impl Fpga {
    pub fn new() -> Self {
        Self {
            status:         FpgaStatus::from_bits_truncate(POWER_ON_STATUS),
            state:          GateState::Uninit,
            firmware_byte:  0,
            firmware:       vec![0; FIRMWARE_SIZE],
        }
    }

    pub fn power_on(&mut self) {
        self.status = FpgaStatus::from_bits_truncate(POWER_ON_STATUS);
        self.unload();
    }

    /// Drop the program and return to the unconfigured state.
    pub fn unload(&mut self) {
        self.status.remove(FpgaStatus::CONFIGURED | FpgaStatus::DONE);
        self.state = GateState::Uninit;
        self.firmware_byte = 0;
        self.firmware.fill(0);
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_open()
    }

    pub fn variant(&self) -> Option<CipherVariant> {
        match self.state {
            GateState::Initialized{variant} => Some(variant),
            _ => None,
        }
    }

    /// The program as received so far.
    pub fn image(&self) -> &[u8] {
        &self.firmware
    }

    pub fn read_status(&self) -> u16 {
        ((self.status - FpgaStatus::CONFIGURED) | FpgaStatus::READY).bits()
    }

    /// Returns true if the write unloaded the program.
    /// The rest of the board must then be reset.
    pub fn write_status(&mut self, data: u16) -> bool {
        if self.is_initialized() {
            let unload = self.status.contains(FpgaStatus::CONFIGURED) && !u16::test_bit(data, 14);
            if unload {
                info!("FPGA unloaded by status write {:04x}", data);
                self.unload();
            }
            self.status = FpgaStatus::from_bits_truncate(data);
            unload
        } else {
            let (state, status) = handshake(self.state, self.status, data);
            debug!("FPGA status write {:04x}: {:?} -> {:?}, status {:04x}", data, self.state, state, status.bits());
            self.state = state;
            self.status = status;
            false
        }
    }

    /// Shift in one bit of the program from bit 15.
    ///
    /// Returns the selected cipher once the final bit arrives.
    pub fn write_firmware(&mut self, data: u16) -> Option<CipherVariant> {
        if self.is_initialized() || !self.status.contains(FpgaStatus::PROGRAM) {
            return None;
        }

        let bits_received = self.state.bits_received();
        self.firmware_byte |= ((data >> 15) as u8) << (bits_received % 8);
        let bits_received = bits_received + 1;

        if bits_received % 8 == 0 {
            let offset = (bits_received / 8 - 1) as usize;
            self.firmware[offset] = self.firmware_byte;
            self.firmware_byte = 0;
        }

        if bits_received == FIRMWARE_BITS {
            // Whatever was sent is accepted as a valid program.
            self.status.insert(FpgaStatus::DONE | FpgaStatus::CONFIGURED);
            let crc = crc32::checksum(&self.firmware);
            let variant = CipherVariant::from_firmware_crc(crc);
            info!("FPGA program loaded: crc {:08x}, {:?} cipher", crc, variant);
            self.state = GateState::Initialized{variant};
            Some(variant)
        } else {
            self.state = GateState::Loading{
                bits_received:  bits_received,
                pre_init:       self.state.is_pre_init(),
            };
            None
        }
    }
}

/// Load an FPGA program from disk.
pub fn read_image(path: &Path) -> io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut image = Vec::new();
    file.read_to_end(&mut image)?;
    if image.len() != FIRMWARE_SIZE {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("expected FPGA program to be {}B, was {}B", FIRMWARE_SIZE, image.len())
        ));
    }
    Ok(image)
}

/// The firmware register writes that transfer an image.
/// Each write carries one bit in bit 15, lowest bit of each byte first.
pub fn image_bits(image: &[u8]) -> impl Iterator<Item = u16> + '_ {
    image.iter().flat_map(|&byte| (0..8).map(move |i| (((byte >> i) & 1) as u16) << 15))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pattern_image() -> Vec<u8> {
        (0..FIRMWARE_SIZE).map(|i| (i * 7) as u8).collect()
    }

    fn armed() -> Fpga {
        let mut fpga = Fpga::new();
        fpga.write_status(0x8000);
        fpga
    }

    #[test]
    fn first_write_arms() {
        let (state, status) = handshake(GateState::Uninit, FpgaStatus::from_bits_truncate(0x8FFF), 0x8000);
        assert_eq!(state, GateState::PreInit);
        assert_eq!(status.bits(), 0x1FFF);
    }

    #[test]
    fn program_bit_needs_two_writes() {
        // First write only arms.
        let (state, status) = handshake(GateState::Uninit, FpgaStatus::from_bits_truncate(0x0FFF), 0x1000);
        assert_eq!(state, GateState::PreInit);
        assert_eq!(status.bits(), 0x0FFF);

        // Second write toggles.
        let (state, status) = handshake(state, status, 0x1000);
        assert_eq!(state, GateState::PreInit);
        assert_eq!(status.bits(), 0x1FFF);

        let (_, status) = handshake(state, status, 0x4000);
        assert_eq!(status.bits(), 0x0FFF);
    }

    #[test]
    fn arm_and_toggle_in_one_write() {
        // Arming sets the program bit, then the same write toggles it back off.
        let (state, status) = handshake(GateState::Uninit, FpgaStatus::from_bits_truncate(0x8FFF), 0x9000);
        assert_eq!(state, GateState::PreInit);
        assert_eq!(status.bits(), 0x0FFF);
    }

    #[test]
    fn rearm_is_ignored() {
        let (state, status) = handshake(GateState::PreInit, FpgaStatus::from_bits_truncate(0x1FFF), 0x2000);
        assert_eq!(state, GateState::PreInit);
        assert_eq!(status.bits(), 0x1FFF);
    }

    #[test]
    fn status_read_masks() {
        let mut fpga = Fpga::new();
        assert_eq!(fpga.read_status(), 0x8FFF);
        fpga.write_status(0x8000);
        assert_eq!(fpga.read_status(), 0x9FFF);
    }

    #[test]
    fn bits_ignored_before_program() {
        let mut fpga = Fpga::new();
        assert_eq!(fpga.write_firmware(0x8000), None);
        assert_eq!(fpga.state(), GateState::Uninit);
    }

    #[test]
    fn load_image() {
        let image = pattern_image();
        let mut fpga = armed();
        let mut result = None;
        for (i, bit) in image_bits(&image).enumerate() {
            assert!(!fpga.is_initialized());
            result = fpga.write_firmware(bit);
            if i < FIRMWARE_SIZE * 8 - 1 {
                assert_eq!(result, None);
            }
        }
        assert_eq!(result, Some(CipherVariant::Default));
        assert!(fpga.is_initialized());
        assert_eq!(fpga.image(), image.as_slice());

        let status = fpga.read_status();
        assert_ne!(status & 0x8000, 0);
        assert_eq!(status & 0x4000, 0);
        assert_ne!(status & 0x2000, 0);

        // Program is fixed once loaded.
        assert_eq!(fpga.write_firmware(0x8000), None);
        assert_eq!(fpga.image(), image.as_slice());
    }

    #[test]
    fn partial_byte_progress() {
        let mut fpga = armed();
        for _ in 0..3 {
            fpga.write_firmware(0x8000);
        }
        assert_eq!(fpga.state(), GateState::Loading{bits_received: 3, pre_init: true});
        for _ in 0..5 {
            fpga.write_firmware(0x0000);
        }
        assert_eq!(fpga.image()[0], 0x07);
    }

    #[test]
    fn unload_on_configured_clear() {
        let image = pattern_image();
        let mut fpga = armed();
        image_bits(&image).for_each(|bit| { fpga.write_firmware(bit); });

        // Keeping 0x4000 set leaves the program alone.
        assert!(!fpga.write_status(0x4000));
        assert!(fpga.is_initialized());

        assert!(fpga.write_status(0x1234));
        assert!(!fpga.is_initialized());
        assert_eq!(fpga.state(), GateState::Uninit);
        assert!(fpga.image().iter().all(|b| *b == 0));
        assert_eq!(fpga.read_status(), 0x9234);
    }

    #[test]
    fn load_without_arming() {
        // After an unload the program bit can be left set, so bits flow unarmed.
        let mut fpga = Fpga::new();
        fpga.status = FpgaStatus::PROGRAM;
        fpga.write_firmware(0x8000);
        assert_eq!(fpga.state(), GateState::Loading{bits_received: 1, pre_init: false});

        // The next handshake write only arms.
        fpga.write_status(0x1000);
        assert_eq!(fpga.state(), GateState::Loading{bits_received: 1, pre_init: true});
        assert!(fpga.status.contains(FpgaStatus::PROGRAM));
    }

    #[test]
    fn image_size_checked() {
        let path = std::env::temp_dir().join("dio_fpga_short.bin");
        std::fs::write(&path, [0_u8; 16]).unwrap();
        let err = read_image(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        std::fs::remove_file(&path).unwrap();
    }
}

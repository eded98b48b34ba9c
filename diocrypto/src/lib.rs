//! Stream ciphers for MPEG data stored on the digital I/O board.

pub mod crc32;
mod standard;
mod alternate;
mod u16;

/// Image CRC of the one FPGA program that uses the alternate cipher.
pub const ALTERNATE_FIRMWARE_CRC: u32 = 0xC0D5_8BCA;

/// Which cipher the loaded FPGA program implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CipherVariant {
    #[default]
    Default,
    Alternate,
}

impl CipherVariant {
    /// Select the cipher from the CRC of the FPGA image.
    ///
    /// Any unrecognised image is assumed to be a standard one.
    pub fn from_firmware_crc(crc: u32) -> Self {
        if crc == ALTERNATE_FIRMWARE_CRC {
            CipherVariant::Alternate
        } else {
            CipherVariant::Default
        }
    }
}

/// Key registers plus the algorithm they feed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CipherState {
    pub key1:       u16,
    pub key2:       u16,
    pub key3:       u8,
    pub variant:    CipherVariant,
}

impl CipherState {
    pub fn new(variant: CipherVariant) -> Self {
        Self {
            key1:       0,
            key2:       0,
            key3:       0,
            variant:    variant,
        }
    }

    /// Decrypt the next word of the stream, advancing the keys.
    pub fn advance(&mut self, data: u16) -> u16 {
        match self.variant {
            CipherVariant::Default => {
                let (out, key1, key2, key3) = standard::decrypt(data, self.key1, self.key2, self.key3);
                self.key1 = key1;
                self.key2 = key2;
                self.key3 = key3;
                out
            },
            CipherVariant::Alternate => {
                let (out, key3) = alternate::decrypt(data, self.key1, self.key3);
                self.key3 = key3;
                out
            },
        }
    }

    /// Zero all keys. The variant is kept.
    pub fn clear_keys(&mut self) {
        self.key1 = 0;
        self.key2 = 0;
        self.key3 = 0;
    }
}

//! Konami System 573 digital I/O board.
//!
//! The board plugs into the host's expansion bus. It holds an FPGA that
//! must be programmed before anything else responds, 24MiB of RAM for
//! encrypted MP3 data, a stream decryptor feeding an MP3 decoder, a
//! network multiplexer for linked cabinets, and discrete outputs for
//! cabinet lamps.
//!
//! Chips outside the board are supplied by the host through the traits
//! in `devices`.

mod constants;
mod devices;
mod fpga;
mod ram;
mod mpeg;
mod digitalid;
mod output;
mod network;
mod timers;
mod board;
mod utils;
#[cfg(test)]
mod testing;

pub use board::{
    DigitalIOBoard,
    BoardConfig,
    ConfigError,
    DeviceControl,
    RamControl,
    MAX_RAM_WORDS,
    DEFAULT_NETWORK_PORTS,
};
pub use constants::{
    CYCLES_PER_SECOND,
    MPEG_TRANSFER_CYCLES,
    NETWORK_PUMP_CYCLES,
};
pub use devices::{
    AudioChannels,
    Mp3Decoder,
    IdentityChip,
    OutputLines,
};
pub use fpga::{
    GateState,
    FIRMWARE_SIZE,
    read_image,
    image_bits,
};
pub use mpeg::{Mpeg, MpegControl, PlaybackStatus};
pub use network::{
    Network,
    SerialLink,
    ChannelLink,
    FrameAssembler,
    FRAME_DELIMITER,
};
pub use ram::{WindowRAM, DEFAULT_RAM_WORDS};
pub use utils::meminterface::{Access, MemInterface16};

pub use diocrypto::CipherVariant;

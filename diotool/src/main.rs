use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, trace, warn};

use dio::{
    DigitalIOBoard, BoardConfig,
    Mp3Decoder, IdentityChip, AudioChannels,
    ChannelLink, SerialLink, MemInterface16,
    NETWORK_PUMP_CYCLES, FIRMWARE_SIZE,
};
use diocrypto::{CipherState, CipherVariant};

use std::{
    fs,
    path::PathBuf,
};

#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    #[clap(subcommand)]
    command: Command,

    /// Logging.
    #[clap(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the fingerprint of an FPGA program.
    Firmware {
        image: PathBuf,
    },

    /// Decrypt an MP3 dump the way the board streams it.
    Decrypt {
        input: PathBuf,

        /// Output file location.
        #[clap(short, long)]
        output: PathBuf,

        #[clap(long, parse(try_from_str = parse_u16), default_value = "0")]
        key1: u16,

        #[clap(long, parse(try_from_str = parse_u16), default_value = "0")]
        key2: u16,

        #[clap(long, parse(try_from_str = parse_u16), default_value = "0")]
        key3: u16,

        /// Use the cipher of the alternate FPGA program.
        #[clap(short, long)]
        alternate: bool,
    },

    /// Send a frame from a board to a cable, and echo it back.
    Loopback {
        /// This cabinet's network id.
        #[clap(long, parse(try_from_str = parse_u16), default_value = "1")]
        id: u16,

        /// Frame bytes in hex, e.g. "c0 01 41 c0".
        #[clap(long)]
        frame: String,

        #[clap(long, default_value_t = dio::DEFAULT_NETWORK_PORTS)]
        ports: usize,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose {log::LevelFilter::Debug} else {log::LevelFilter::Warn};
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    match args.command {
        Command::Firmware { image } => firmware_info(image),
        Command::Decrypt { input, output, key1, key2, key3, alternate } => {
            let variant = if alternate {CipherVariant::Alternate} else {CipherVariant::Default};
            decrypt(input, output, key1, key2, key3, variant)
        },
        Command::Loopback { id, frame, ports } => loopback(id, &frame, ports),
    }
}

fn firmware_info(path: PathBuf) -> Result<()> {
    let image = dio::read_image(&path)
        .with_context(|| format!("couldn't load FPGA program {}", path.display()))?;
    let crc = diocrypto::crc32::checksum(&image);
    println!("CRC-32:  {:08X}", crc);
    println!("Cipher:  {:?}", CipherVariant::from_firmware_crc(crc));
    Ok(())
}

fn decrypt(in_path: PathBuf, out_path: PathBuf, key1: u16, key2: u16, key3: u16, variant: CipherVariant) -> Result<()> {
    let data = fs::read(&in_path)
        .with_context(|| format!("couldn't read {}", in_path.display()))?;
    if data.len() % 2 != 0 {
        warn!("ignoring trailing byte of odd-sized input");
    }

    let mut cipher = CipherState::new(variant);
    cipher.key1 = key1;
    // The alternate program has no writable key 2 or 3.
    if variant == CipherVariant::Default {
        cipher.key2 = key2;
        cipher.key3 = key3 as u8;
    } else if key2 != 0 || key3 != 0 {
        warn!("key 2 and key 3 are unused by the alternate cipher");
    }

    let output_buffer = data.chunks_exact(2)
        .map(|chunk| u16::from_le_bytes([chunk[0], chunk[1]]))
        .flat_map(|word| cipher.advance(word).to_be_bytes())
        .collect::<Vec<_>>();

    fs::write(&out_path, &output_buffer)
        .with_context(|| format!("couldn't write {}", out_path.display()))?;

    debug!("Decrypted {} bytes to {}", output_buffer.len(), out_path.display());
    Ok(())
}

fn loopback(id: u16, frame: &str, ports: usize) -> Result<()> {
    let frame = parse_hex_bytes(frame)?;

    let config = BoardConfig {
        network_ports: ports,
        ..Default::default()
    };
    let mut board = DigitalIOBoard::new(&config, NullDecoder, NullIdentity, |line: u8, state: bool| {
        trace!("output {} = {}", line, state);
    })?;

    if board.boot(&vec![0; FIRMWARE_SIZE]).is_none() {
        bail!("board didn't accept the FPGA program");
    }

    let (near, mut far) = ChannelLink::pair();
    board.connect_network(0, Box::new(near))?;
    board.write_halfword(0x90, id);

    for &data in frame.iter() {
        board.write_halfword(0xC0, data as u16);
    }
    println!("Queued:   {} bytes", board.read_halfword(0xC2));

    board.clock(NETWORK_PUMP_CYCLES);
    let sent = far.drain();
    println!("Sent:     {:02X?}", sent);

    // Anything with our id is dropped on the way back in.
    for &data in sent.iter() {
        far.output(data);
    }
    board.clock(NETWORK_PUMP_CYCLES);
    let received = (0..board.read_halfword(0xC4))
        .map(|_| board.read_halfword(0xC0) as u8)
        .collect::<Vec<_>>();
    println!("Received: {:02X?}", received);

    Ok(())
}

struct NullDecoder;

impl Mp3Decoder for NullDecoder {
    fn sid_write(&mut self, data: u8) {
        trace!("decoder <- {:02x}", data);
    }

    fn reset_mpeg_state(&mut self) {}

    fn set_output_gain(&mut self, channels: AudioChannels, gain: f32) {
        debug!("decoder gain {:?} = {}", channels, gain);
    }
}

struct NullIdentity;

impl IdentityChip for NullIdentity {
    fn read(&mut self) -> bool {
        true
    }

    fn write(&mut self, _state: bool) {}
}

/// Accepts decimal, or hex with a 0x prefix.
fn parse_u16(s: &str) -> Result<u16> {
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(value)
}

fn parse_hex_bytes(s: &str) -> Result<Vec<u8>> {
    let digits = s.chars().filter(|c| !c.is_whitespace()).collect::<String>();
    if !digits.is_ascii() {
        bail!("frame \"{}\" isn't hex", s);
    }
    if digits.len() % 2 != 0 {
        return Err(anyhow!("odd number of hex digits in \"{}\"", s));
    }
    (0..digits.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&digits[i..(i + 2)], 16).with_context(|| format!("bad hex byte \"{}\"", &digits[i..(i + 2)])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_bytes() {
        assert_eq!(parse_hex_bytes("c0 01 41 c0").unwrap(), vec![0xC0, 0x01, 0x41, 0xC0]);
        assert_eq!(parse_hex_bytes("C00102C0").unwrap(), vec![0xC0, 0x01, 0x02, 0xC0]);
        assert!(parse_hex_bytes("c0 1").is_err());
        assert!(parse_hex_bytes("zz").is_err());
    }

    #[test]
    fn keys() {
        assert_eq!(parse_u16("0x8000").unwrap(), 0x8000);
        assert_eq!(parse_u16("42").unwrap(), 42);
        assert!(parse_u16("0x10000").is_err());
    }
}

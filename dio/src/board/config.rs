use std::fmt;

use crate::ram::DEFAULT_RAM_WORDS;

/// Largest store the 25-bit address cursors can reach.
pub const MAX_RAM_WORDS: usize = 0x100_0000;

/// Two RCA connectors on the board.
pub const DEFAULT_NETWORK_PORTS: usize = 2;

#[derive(Clone, Debug)]
pub struct BoardConfig {
    /// Size of the MP3 store in 16-bit words.
    pub ram_words:      usize,
    pub network_ports:  usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            ram_words:      DEFAULT_RAM_WORDS,
            network_ports:  DEFAULT_NETWORK_PORTS,
        }
    }
}

impl BoardConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ram_words == 0 {
            Err(ConfigError::NoRam)
        } else if self.ram_words > MAX_RAM_WORDS {
            Err(ConfigError::RamTooLarge(self.ram_words))
        } else if self.network_ports == 0 {
            Err(ConfigError::NoNetworkPorts)
        } else {
            Ok(())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    NoRam,
    RamTooLarge(usize),
    NoNetworkPorts,
    NoSuchPort(usize),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::NoRam => write!(f, "board needs at least one word of RAM"),
            ConfigError::RamTooLarge(words) => write!(f, "{:#x} words of RAM is more than the address range ({:#x})", words, MAX_RAM_WORDS),
            ConfigError::NoNetworkPorts => write!(f, "board needs at least one network port"),
            ConfigError::NoSuchPort(port) => write!(f, "no network port {}", port),
        }
    }
}

impl std::error::Error for ConfigError {}

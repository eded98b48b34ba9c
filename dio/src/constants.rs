//! Constants for timing.

/// Host clock: 768 cycles for every 44.1kHz sample.
pub const CYCLES_PER_SECOND: usize = 33_868_800;

/// Rate at which the MPEG engine feeds bytes while the decoder demands them.
pub const MPEG_TRANSFER_HZ: usize = 44_100;
/// Cycles between MPEG transfers.
pub const MPEG_TRANSFER_CYCLES: usize = CYCLES_PER_SECOND / MPEG_TRANSFER_HZ;

/// Rate at which the network ports are serviced.
pub const NETWORK_PUMP_HZ: usize = 300;
/// Cycles between network pumps.
pub const NETWORK_PUMP_CYCLES: usize = CYCLES_PER_SECOND / NETWORK_PUMP_HZ;

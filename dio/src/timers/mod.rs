//! Board timers.
//!
//! Two periodic sources share one timeline: the MPEG transfer (only while
//! the decoder demands data) and the network pump (always).

mod timer;

use bitflags::bitflags;
use crate::constants::{MPEG_TRANSFER_CYCLES, NETWORK_PUMP_CYCLES};
use timer::Timer;

bitflags! {
    #[derive(Default)]
    pub struct TimerEvents: u8 {
        const MPEG_TRANSFER = 1 << 0;
        const NETWORK_PUMP  = 1 << 1;
    }
}

pub struct Timers {
    mpeg:       Timer,
    network:    Timer,
}

impl Timers {
    pub fn new() -> Self {
        let mut network = Timer::new(NETWORK_PUMP_CYCLES);
        network.start();
        Self {
            mpeg:       Timer::new(MPEG_TRANSFER_CYCLES),
            network:    network,
        }
    }

    pub fn start_mpeg(&mut self) {
        self.mpeg.start();
    }

    pub fn stop_mpeg(&mut self) {
        self.mpeg.stop();
    }

    pub fn mpeg_running(&self) -> bool {
        self.mpeg.is_enabled()
    }

    /// Advance up to the next deadline, but no more than `cycles`.
    ///
    /// Returns how many cycles were consumed and which timers fired.
    /// Call repeatedly to cover a longer span in order.
    pub fn step(&mut self, cycles: usize) -> (usize, TimerEvents) {
        let next = [self.mpeg.remaining(), self.network.remaining()]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(cycles);
        let elapsed = next.min(cycles);

        let mut events = TimerEvents::default();
        events.set(TimerEvents::MPEG_TRANSFER, self.mpeg.clock(elapsed));
        events.set(TimerEvents::NETWORK_PUMP, self.network.clock(elapsed));
        (elapsed, events)
    }
}

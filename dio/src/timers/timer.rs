//! Individual periodic timer.

pub struct Timer {
    /// Cycles left until the timer fires.
    countdown:  usize,
    /// Value to reload countdown with upon start or expiry.
    period:     usize,
    enabled:    bool,
}

impl Timer {
    pub fn new(period: usize) -> Self {
        let period = period.max(1);
        Self {
            countdown:  period,
            period:     period,
            enabled:    false,
        }
    }

    /// Start counting a full period from now.
    pub fn start(&mut self) {
        self.countdown = self.period;
        self.enabled = true;
    }

    pub fn stop(&mut self) {
        self.enabled = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Cycles until the next expiry, if running.
    pub fn remaining(&self) -> Option<usize> {
        if self.enabled {
            Some(self.countdown)
        } else {
            None
        }
    }

    /// Returns true if the timer expired.
    /// Never call with more cycles than `remaining`.
    pub fn clock(&mut self, cycles: usize) -> bool {
        if !self.enabled {
            return false;
        }

        self.countdown -= cycles;
        if self.countdown == 0 {
            self.countdown = self.period;
            true
        } else {
            false
        }
    }
}

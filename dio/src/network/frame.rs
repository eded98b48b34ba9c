//! Delimiter framing shared by the outbound register and each inbound port.

use std::collections::VecDeque;

/// Marks both ends of a frame. Payload bytes are not escaped.
pub const FRAME_DELIMITER: u8 = 0xC0;

#[derive(Default)]
pub struct FrameAssembler {
    buffer: VecDeque<u8>,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Add a word, and return the frame if it is now complete.
    ///
    /// Only the low byte is stored, but the whole word must match to
    /// count as a delimiter. Words are dropped until a delimiter starts
    /// a frame. An empty frame (two delimiters) is treated as corrupt:
    /// the first delimiter is dropped and the second starts a new frame.
    pub fn push(&mut self, data: u16) -> Option<Vec<u8>> {
        let delimiter = data == u16::from(FRAME_DELIMITER);
        match self.buffer.front() {
            None if !delimiter => return None,
            Some(&start) if start != FRAME_DELIMITER => return None,
            _ => {},
        }

        self.buffer.push_back(data as u8);

        if !delimiter || self.buffer.len() <= 1 {
            return None;
        }

        if self.buffer.len() == 2 {
            self.buffer.pop_front();
            return None;
        }

        Some(self.buffer.drain(..).collect())
    }
}

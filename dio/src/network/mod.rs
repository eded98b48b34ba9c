//! Network multiplexer.
//!
//! Cabinets are daisy-chained over serial links. Frames arriving on any
//! port are merged into a single input queue for the host, unless they
//! came from this cabinet. Frames the host writes are queued and sent
//! out of every port, one frame per pump.

mod frame;
mod link;

use std::collections::VecDeque;
use log::{debug, trace};

use crate::utils::meminterface::Access;

pub use frame::{FrameAssembler, FRAME_DELIMITER};
pub use link::{SerialLink, ChannelLink};

/// Byte 1 of every frame is the id of the machine that sent it.
const ORIGIN_ID_INDEX: usize = 1;

struct Port {
    link:   Option<Box<dyn SerialLink>>,
    input:  FrameAssembler,
}

pub struct Network {
    ports:              Vec<Port>,

    muxed_input:        VecDeque<u8>,
    output_frame:       FrameAssembler,
    output_queue:       VecDeque<Vec<u8>>,
    output_byte_count:  u16,

    local_id:           u16,
}

impl Network {
    pub fn new(num_ports: usize) -> Self {
        Self {
            ports:              (0..num_ports).map(|_| Port {
                link:   None,
                input:  FrameAssembler::new(),
            }).collect(),

            muxed_input:        VecDeque::new(),
            output_frame:       FrameAssembler::new(),
            output_queue:       VecDeque::new(),
            output_byte_count:  0,

            local_id:           0,
        }
    }

    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    /// Plug a link into a port. Returns the link that was there before.
    ///
    /// Panics if the port doesn't exist.
    pub fn connect(&mut self, port: usize, link: Box<dyn SerialLink>) -> Option<Box<dyn SerialLink>> {
        self.ports[port].link.replace(link)
    }

    pub fn disconnect(&mut self, port: usize) -> Option<Box<dyn SerialLink>> {
        self.ports.get_mut(port).and_then(|p| p.link.take())
    }

    pub fn is_connected(&self, port: usize) -> bool {
        self.ports.get(port).map_or(false, |p| p.link.is_some())
    }

    pub fn local_id(&self) -> u16 {
        self.local_id
    }

    pub fn set_local_id(&mut self, id: u16) {
        debug!("network id: {}", id);
        self.local_id = id;
    }

    /// Next received byte, or 0 if nothing is waiting.
    pub fn read(&mut self, access: Access) -> u16 {
        let data = if access.has_side_effects() {
            self.muxed_input.pop_front()
        } else {
            self.muxed_input.front().copied()
        };
        data.map_or(0, u16::from)
    }

    /// Add a word to the outgoing frame.
    pub fn write(&mut self, data: u16) {
        if let Some(frame) = self.output_frame.push(data) {
            trace!("queued frame: {:02x?}", frame);
            self.output_byte_count = self.output_byte_count.wrapping_add(frame.len() as u16);
            self.output_queue.push_back(frame);
        }
    }

    /// Bytes in complete frames waiting to be sent.
    pub fn output_buffer_size(&self) -> u16 {
        self.output_byte_count
    }

    /// Bytes waiting to be read by the host.
    pub fn input_buffer_size(&self) -> u16 {
        self.muxed_input.len() as u16
    }

    /// Drop everything in flight. The local id and links are kept.
    pub fn reset(&mut self) {
        self.output_byte_count = 0;
        self.muxed_input.clear();
        self.output_frame.clear();
        self.output_queue.clear();
        for port in self.ports.iter_mut() {
            port.input.clear();
        }
    }

    /// Return to power-on state. Links stay plugged in.
    pub fn clear(&mut self) {
        self.reset();
        self.local_id = 0;
    }

    /// Move traffic between the links and the buffers.
    pub fn pump(&mut self) {
        for port in self.ports.iter_mut() {
            let link = match port.link.as_mut() {
                Some(link) => link,
                None => continue,
            };
            while let Some(data) = link.input() {
                let frame = match port.input.push(u16::from(data)) {
                    Some(frame) => frame,
                    None => continue,
                };
                if u16::from(frame[ORIGIN_ID_INDEX]) == self.local_id {
                    trace!("dropped own frame: {:02x?}", frame);
                } else {
                    trace!("received frame: {:02x?}", frame);
                    self.muxed_input.extend(frame);
                }
            }
        }

        if let Some(frame) = self.output_queue.pop_front() {
            for link in self.ports.iter_mut().filter_map(|p| p.link.as_mut()) {
                for &data in frame.iter() {
                    link.output(data);
                }
            }
            self.output_byte_count = self.output_byte_count.wrapping_sub(frame.len() as u16);
        }
    }
}

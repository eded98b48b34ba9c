//! Serial links plugged into the network ports.

use crossbeam_channel::{Sender, Receiver, TryRecvError, unbounded};
use log::trace;

/// A byte-oriented serial connection.
pub trait SerialLink {
    /// Next received byte, if one is waiting.
    fn input(&mut self) -> Option<u8>;
    fn output(&mut self, data: u8);
}

/// One end of an in-memory cable.
pub struct ChannelLink {
    send:   Sender<u8>,
    recv:   Receiver<u8>,
}

impl ChannelLink {
    /// Make both ends of a cable.
    pub fn pair() -> (ChannelLink, ChannelLink) {
        let (send_a, recv_a) = unbounded();
        let (send_b, recv_b) = unbounded();
        (Self{
            send:   send_a,
            recv:   recv_b,
        }, Self{
            send:   send_b,
            recv:   recv_a,
        })
    }

    /// Everything received so far.
    pub fn drain(&mut self) -> Vec<u8> {
        self.recv.try_iter().collect()
    }
}

impl SerialLink for ChannelLink {
    fn input(&mut self) -> Option<u8> {
        match self.recv.try_recv() {
            Ok(data) => Some(data),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => None,
        }
    }

    fn output(&mut self, data: u8) {
        // Bytes sent down an unplugged cable are lost.
        if self.send.send(data).is_err() {
            trace!("dropped {:02x}: far end disconnected", data);
        }
    }
}

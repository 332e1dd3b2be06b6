//! Outbound notification capability
//!
//! The core never talks to sockets. It hands packets to an `Observer`,
//! addressed either to one connection or to everyone, and the transport
//! decides how and when to deliver them.

use shared::{ConnectionId, Packet};

pub trait Observer {
    fn notify_one(&mut self, id: ConnectionId, packet: Packet);
    fn notify_all(&mut self, packet: Packet);
}

#[derive(Debug, Clone)]
pub enum Notification {
    One { id: ConnectionId, packet: Packet },
    All { packet: Packet },
}

/// Buffers notifications in emission order until the owner drains them.
#[derive(Debug, Default)]
pub struct Outbox {
    pending: Vec<Notification>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.pending)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Observer for Outbox {
    fn notify_one(&mut self, id: ConnectionId, packet: Packet) {
        self.pending.push(Notification::One { id, packet });
    }

    fn notify_all(&mut self, packet: Packet) {
        self.pending.push(Notification::All { packet });
    }
}

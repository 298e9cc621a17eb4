/// Session engine — packet dispatch hooks, host commands, and the polled
/// tick, wired over every component of this crate.
///
/// The transport layer drives the hooks synchronously from the foreground
/// loop; the host executes the returned effects and forwards emitted
/// events to the UI. Nothing here blocks, allocates unboundedly, or
/// panics on hostile input.
mod effect;
mod state;

pub use effect::{Outbound, Route, SessionEffect};
pub use state::SessionState;

use crate::directory::{Message, NodeInfo};
use crate::types::ContactId;

/// Which routing the transport received a packet through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteKind {
    Flood,
    Direct,
}

/// Metadata the transport extracted from a received packet.
#[derive(Debug, Clone)]
pub struct PacketMeta {
    pub rssi: i16,
    pub snr: f32,
    pub route: RouteKind,
    /// Hop path accumulated by flood routing, or the explicit route of a
    /// direct packet.
    pub path: Vec<u8>,
}

impl PacketMeta {
    pub fn flood(path: Vec<u8>) -> Self {
        Self {
            rssi: 0,
            snr: 0.0,
            route: RouteKind::Flood,
            path,
        }
    }

    pub fn direct(path: Vec<u8>) -> Self {
        Self {
            rssi: 0,
            snr: 0.0,
            route: RouteKind::Direct,
            path,
        }
    }

    /// Hop count for display. Only meaningful on flood packets.
    pub fn hops(&self) -> u8 {
        match self.route {
            RouteKind::Flood => self.path.len() as u8,
            RouteKind::Direct => 0,
        }
    }
}

/// Events surfaced to the host/UI layer.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A message entered the history ring (inbound or our own).
    MessageStored(Message),

    /// A node was discovered or refreshed from an advertisement.
    NodeDiscovered(NodeInfo),

    /// A decrypted channel message arrived.
    ChannelMessageReceived {
        channel_idx: u8,
        sender: String,
        text: String,
        timestamp: u32,
        hops: u8,
    },

    /// A direct message arrived from a DM peer.
    DirectMessageReceived {
        contact: ContactId,
        sender: String,
        text: String,
        timestamp: u32,
    },

    /// Terminal outcome of a tracked direct message.
    DeliveryStatus {
        contact: ContactId,
        ack_tag: u32,
        delivered: bool,
        attempts: u8,
    },

    /// The network repeated one of our channel messages.
    RepeatCountUpdated {
        channel_idx: u8,
        content_hash: u32,
        count: u32,
    },

    /// Repeater login concluded.
    LoginResult {
        success: bool,
        permissions: u8,
        name: String,
    },

    /// CLI response text from the connected repeater.
    CliResponse { text: String },
}

use crate::types::{PubKey, SharedSecret};

use super::SessionEvent;

/// Intention produite par la logique pure de SessionState.
///
/// Chaque hook / commande / tick retourne Vec<SessionEffect>.
/// La boucle hote execute ensuite ces effets via le transport et l'UI.
#[derive(Debug)]
pub enum SessionEffect {
    /// Encoder, chiffrer et emettre un paquet via le transport.
    Send(Outbound),

    /// Remonter un evenement a l'hote (UI, notifications).
    Emit(SessionEvent),

    /// Ecrire une trame encodee sur le lien companion.
    CompanionWrite(Vec<u8>),
}

/// How a packet leaves this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Broadcast dissemination; every receiving node may re-transmit.
    Flood,
    /// Unicast along a previously learned hop sequence.
    Direct { path: Vec<u8> },
}

/// A packet for the transport to encode and send. Encryption and outer
/// framing happen in the transport; this core hands over payloads plus
/// the key material it cached for the peer.
#[derive(Debug)]
pub enum Outbound {
    /// Identity advertisement, flooded.
    Advert { app_data: Vec<u8> },

    /// Plain unencrypted broadcast datagram, flooded.
    Broadcast { payload: Vec<u8> },

    /// Encrypted channel datagram, flooded.
    ChannelText { channel_idx: u8, payload: Vec<u8> },

    /// Encrypted datagram to a known peer.
    PeerText {
        pubkey: PubKey,
        secret: SharedSecret,
        payload: Vec<u8>,
        route: Route,
    },

    /// Authenticated anonymous request — carries our public key so the
    /// peer can derive the shared secret (used for repeater login).
    AnonRequest {
        pubkey: PubKey,
        secret: SharedSecret,
        payload: Vec<u8>,
    },

    /// Bare acknowledgement, flooded.
    Ack { tag: u32 },

    /// Path-return with an embedded acknowledgement — gives the original
    /// sender a return route along with the delivery confirmation.
    PathReturnAck {
        pubkey: PubKey,
        secret: SharedSecret,
        path: Vec<u8>,
        tag: u32,
    },
}

use serde::{Deserialize, Serialize};

/// 32-bit contact identifier — the first four bytes of the transport's
/// identity hash, little-endian.
pub type ContactId = u32;

/// Length of a public key as the transport layer exposes it.
pub const PUB_KEY_LEN: usize = 32;

/// A peer's full public key.
pub type PubKey = [u8; PUB_KEY_LEN];

/// Shared secret derived by the transport from a peer's public key.
pub type SharedSecret = [u8; 32];

/// Length of the transport's identity hash.
pub const IDENTITY_HASH_LEN: usize = 8;

/// Node type carried in advertisements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeType {
    Unknown,
    Chat,
    Repeater,
    Room,
    Sensor,
}

impl NodeType {
    /// Decode from the low nibble of an advertisement's first byte.
    pub fn from_wire(b: u8) -> Self {
        match b & 0x0F {
            1 => NodeType::Chat,
            2 => NodeType::Repeater,
            3 => NodeType::Room,
            4 => NodeType::Sensor,
            _ => NodeType::Unknown,
        }
    }

    pub fn to_wire(self) -> u8 {
        match self {
            NodeType::Unknown => 0,
            NodeType::Chat => 1,
            NodeType::Repeater => 2,
            NodeType::Room => 3,
            NodeType::Sensor => 4,
        }
    }
}

// ── Capacity ceilings ──────────────────────────────────────────────────
// Fixed tables are the backpressure mechanism: once full, admission fails
// cleanly instead of growing memory. The ceilings are sized for the target
// hardware's RAM, not defaults to be raised casually.

/// Maximum nodes tracked in the in-RAM directory. No eviction.
pub const MAX_NODES: usize = 64;

/// Broadcast/channel message history ring size.
pub const MESSAGE_HISTORY: usize = 50;

/// Direct-message peer table slots.
pub const MAX_DM_PEERS: usize = 8;

/// Concurrent in-flight direct messages.
pub const MAX_PENDING_DMS: usize = 4;

/// Concurrent tracked outgoing channel messages.
pub const MAX_CHANNEL_STATS: usize = 8;

/// Offline companion-notification queue capacity.
pub const OFFLINE_QUEUE_CAP: usize = 16;

/// Maximum hops in a learned route.
pub const MAX_ROUTE_LEN: usize = 64;

/// Maximum direct-message text length. With the 5-byte payload header this
/// keeps the retry-safe payload copy under 260 bytes.
pub const MAX_DM_TEXT: usize = 249;

// ── Expiry windows ─────────────────────────────────────────────────────

/// A learned route older than this is treated as unknown.
pub const PATH_EXPIRY_MS: u64 = 30 * 60 * 1000;

/// Channel repeat-stats entries stop matching after this long.
pub const CHANNEL_STATS_EXPIRY_MS: u64 = 60_000;

/// Contact id from an identity hash (first four bytes, little-endian).
pub fn contact_id_from_hash(hash: &[u8; IDENTITY_HASH_LEN]) -> ContactId {
    u32::from_le_bytes([hash[0], hash[1], hash[2], hash[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_wire_mapping() {
        for t in [
            NodeType::Unknown,
            NodeType::Chat,
            NodeType::Repeater,
            NodeType::Room,
            NodeType::Sensor,
        ] {
            assert_eq!(NodeType::from_wire(t.to_wire()), t);
        }
        // Upper nibble is flags, not type
        assert_eq!(NodeType::from_wire(0x12), NodeType::Repeater);
        // Unknown codes decode as Unknown
        assert_eq!(NodeType::from_wire(9), NodeType::Unknown);
    }

    #[test]
    fn contact_id_is_little_endian_prefix() {
        let hash = [0xEF, 0xBE, 0xAD, 0xDE, 0x01, 0x02, 0x03, 0x04];
        assert_eq!(contact_id_from_hash(&hash), 0xDEAD_BEEF);
    }
}

use crate::types::{contact_id_from_hash, ContactId, PubKey, SharedSecret, IDENTITY_HASH_LEN};

/// Identity services this core consumes from the transport layer.
///
/// In production: implemented over the transport's local identity (hashing
/// and ECDH live there — this core never touches key material beyond
/// caching derived secrets). In test: a deterministic mock.
pub trait IdentityOps {
    /// This node's contact id.
    fn local_id(&self) -> ContactId;

    /// This node's public key, as sent in outbound authenticated packets.
    fn local_pubkey(&self) -> PubKey;

    /// The transport's identity hash of a public key.
    fn identity_hash(&self, pubkey: &PubKey) -> [u8; IDENTITY_HASH_LEN];

    /// Shared secret with a peer, derived from their public key.
    fn shared_secret(&self, pubkey: &PubKey) -> SharedSecret;
}

/// A peer identity as cached by this core: public key plus identity hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeerIdentity {
    pub pubkey: PubKey,
    pub hash: [u8; IDENTITY_HASH_LEN],
}

impl PeerIdentity {
    pub fn new(pubkey: PubKey, ops: &dyn IdentityOps) -> Self {
        let hash = ops.identity_hash(&pubkey);
        Self { pubkey, hash }
    }

    pub fn contact_id(&self) -> ContactId {
        contact_id_from_hash(&self.hash)
    }

    /// Match against a possibly-truncated hash prefix from a packet.
    /// An empty prefix never matches.
    pub fn matches(&self, prefix: &[u8]) -> bool {
        if prefix.is_empty() {
            return false;
        }
        let n = prefix.len().min(IDENTITY_HASH_LEN);
        self.hash[..n] == prefix[..n]
    }
}

/// A key that is all zeroes has never been learned from an advertisement.
pub fn has_pubkey(key: &PubKey) -> bool {
    key.iter().any(|&b| b != 0)
}

// ── Mock identity (tests) ───────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::mock::{peer_key, MockIdentity};
    use super::*;

    #[test]
    fn hash_prefix_matching() {
        let ops = MockIdentity::new(1);
        let peer = PeerIdentity::new(peer_key(0xAB), &ops);

        assert!(peer.matches(&[0xAB]));
        assert!(peer.matches(&[0xAB, 0xAB, 0xAB]));
        assert!(!peer.matches(&[0xCD]));
        assert!(!peer.matches(&[]));
        // Longer than the hash: only the hash-length prefix counts
        assert!(peer.matches(&[0xAB; 12]));
    }

    #[test]
    fn zero_key_is_not_a_pubkey() {
        assert!(!has_pubkey(&[0u8; 32]));
        assert!(has_pubkey(&peer_key(7)));
        let mut key = [0u8; 32];
        key[31] = 1;
        assert!(has_pubkey(&key));
    }

    #[test]
    fn contact_id_derived_from_hash() {
        let ops = MockIdentity::new(1);
        let peer = PeerIdentity::new(peer_key(0x42), &ops);
        assert_eq!(peer.contact_id(), u32::from_le_bytes([0x42; 4]));
    }
}

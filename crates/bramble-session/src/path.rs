/// DM peer table and learned-route cache.
///
/// One entry per contact we exchange direct messages with: the shared
/// secret the transport derived for them, plus the most recently learned
/// route. Routes age out after 30 minutes; an expired or unknown route
/// forces the next send back to flood so the network re-discovers a path.
use crate::error::SessionError;
use crate::identity::{has_pubkey, IdentityOps, PeerIdentity};
use crate::types::{ContactId, PubKey, SharedSecret, MAX_DM_PEERS, MAX_ROUTE_LEN, PATH_EXPIRY_MS};

/// Route usability predicate.
///
/// `len` is the learned route length in hops, -1 when no route is known.
/// Zero hops is a confirmed direct neighbor and ages out like any other
/// route.
pub fn is_path_valid(len: i8, learned_at: u64, now: u64) -> bool {
    len >= 0 && now.saturating_sub(learned_at) < PATH_EXPIRY_MS
}

/// Per-contact direct-messaging state.
#[derive(Debug, Clone)]
pub struct DmPeer {
    pub contact: ContactId,
    pub identity: PeerIdentity,
    pub secret: SharedSecret,
    route: Vec<u8>,
    route_len: i8,
    learned_at: u64,
}

impl DmPeer {
    fn new(contact: ContactId, identity: PeerIdentity, secret: SharedSecret) -> Self {
        Self {
            contact,
            identity,
            secret,
            route: Vec::new(),
            route_len: -1,
            learned_at: 0,
        }
    }

    /// The learned route, if still valid at `now`.
    pub fn valid_route(&self, now: u64) -> Option<&[u8]> {
        if is_path_valid(self.route_len, self.learned_at, now) {
            Some(&self.route)
        } else {
            None
        }
    }

    /// Route length snapshot: -1 when unknown.
    pub fn route_len(&self) -> i8 {
        self.route_len
    }

    pub fn learned_at(&self) -> u64 {
        self.learned_at
    }

    fn learn(&mut self, route: &[u8], now: u64) {
        let len = route.len().min(MAX_ROUTE_LEN);
        self.route.clear();
        self.route.extend_from_slice(&route[..len]);
        self.route_len = len as i8;
        self.learned_at = now;
    }

    fn clear_route(&mut self) {
        self.route.clear();
        self.route_len = -1;
        self.learned_at = 0;
    }
}

/// Fixed pool of DM peers, admission-controlled.
#[derive(Debug, Default)]
pub struct PeerTable {
    slots: [Option<DmPeer>; MAX_DM_PEERS],
}

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, contact: ContactId) -> Option<&DmPeer> {
        self.slots.iter().flatten().find(|p| p.contact == contact)
    }

    pub fn get_mut(&mut self, contact: ContactId) -> Option<&mut DmPeer> {
        self.slots
            .iter_mut()
            .flatten()
            .find(|p| p.contact == contact)
    }

    /// Find the peer whose identity hash matches a packet's hash prefix.
    pub fn find_by_hash(&self, prefix: &[u8]) -> Option<&DmPeer> {
        self.slots
            .iter()
            .flatten()
            .find(|p| p.identity.matches(prefix))
    }

    /// Look up a peer, creating it lazily from the contact's public key.
    ///
    /// Creation derives the shared secret through the transport's identity
    /// layer. Fails on an all-zero key (no advertisement heard yet) or a
    /// full table — a live peer is never evicted.
    pub fn find_or_create(
        &mut self,
        contact: ContactId,
        pubkey: &PubKey,
        ops: &dyn IdentityOps,
    ) -> Result<&mut DmPeer, SessionError> {
        if !has_pubkey(pubkey) {
            return Err(SessionError::MissingPublicKey);
        }
        // Two passes: borrowck will not let us return early from a loop
        // holding the slot borrow.
        let existing = self
            .slots
            .iter()
            .position(|s| s.as_ref().is_some_and(|p| p.contact == contact));
        let slot = match existing {
            Some(i) => i,
            None => {
                let free = self
                    .slots
                    .iter()
                    .position(|s| s.is_none())
                    .ok_or(SessionError::PeerTableFull)?;
                let identity = PeerIdentity::new(*pubkey, ops);
                let secret = ops.shared_secret(pubkey);
                tracing::debug!(contact = format_args!("{contact:08X}"), slot = free, "created DM peer");
                self.slots[free] = Some(DmPeer::new(contact, identity, secret));
                free
            }
        };
        Ok(self.slots[slot].as_mut().expect("slot just filled"))
    }

    /// Copy a route into the contact's entry (truncated to 64 hops) and
    /// stamp the learn time. A no-op for contacts without a peer entry.
    pub fn learn_path(&mut self, contact: ContactId, route: &[u8], now: u64) {
        if let Some(peer) = self.get_mut(contact) {
            peer.learn(route, now);
            tracing::debug!(
                contact = format_args!("{contact:08X}"),
                hops = peer.route_len,
                "learned route"
            );
        }
    }

    /// Forget the contact's route; the next send falls back to flood.
    pub fn invalidate_path(&mut self, contact: ContactId) {
        if let Some(peer) = self.get_mut(contact) {
            peer.clear_route();
            tracing::debug!(contact = format_args!("{contact:08X}"), "invalidated route");
        }
    }

    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

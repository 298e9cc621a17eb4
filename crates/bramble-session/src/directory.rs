/// In-RAM node directory and broadcast message history.
///
/// Both are capacity-bounded. The node table never evicts — once full,
/// newly heard nodes are dropped until a reboot, which is weaker than a
/// persistent contact store but fits the RAM of the target hardware.
/// The message history is a ring that overwrites oldest-first.
use std::collections::VecDeque;

use crate::types::{ContactId, NodeType, PubKey, MAX_NODES, MESSAGE_HISTORY};

/// A node heard on the mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    pub id: ContactId,
    pub name: String,
    pub node_type: NodeType,
    pub rssi: i16,
    pub snr: f32,
    pub last_heard: u32,
    pub location: Option<(f64, f64)>,
    /// Full public key, once an advertisement carried one. Needed for
    /// direct messaging and repeater login.
    pub pubkey: Option<PubKey>,
}

/// A broadcast or channel message in the history ring.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// 0 for our own messages and channel messages with unknown sender.
    pub sender_id: ContactId,
    pub timestamp: u32,
    pub text: String,
    pub outgoing: bool,
    pub delivered: bool,
}

/// Flat dedup table of discovered nodes, keyed by contact id.
#[derive(Debug, Default)]
pub struct NodeDirectory {
    nodes: Vec<NodeInfo>,
}

impl NodeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or refresh a node. Returns `false` when the node is new and
    /// the table is full (the node is dropped).
    ///
    /// An update never erases a previously learned public key — a later
    /// advertisement heard without one keeps the stored key.
    pub fn upsert(&mut self, node: NodeInfo) -> bool {
        if let Some(existing) = self.nodes.iter_mut().find(|n| n.id == node.id) {
            let kept_key = existing.pubkey;
            *existing = node;
            if existing.pubkey.is_none() {
                existing.pubkey = kept_key;
            }
            return true;
        }
        if self.nodes.len() >= MAX_NODES {
            return false;
        }
        self.nodes.push(node);
        true
    }

    pub fn get(&self, id: ContactId) -> Option<&NodeInfo> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn by_index(&self, index: usize) -> Option<&NodeInfo> {
        self.nodes.get(index)
    }

    /// Look up a node's name, or a synthesized `Node-XXXX` fallback.
    pub fn name_of(&self, id: ContactId) -> String {
        match self.get(id) {
            Some(node) if !node.name.is_empty() => node.name.clone(),
            _ => format!("Node-{:04X}", id & 0xFFFF),
        }
    }

    /// Find a node whose stored public key matches an identity-hash prefix.
    pub fn find_by_hash(
        &self,
        prefix: &[u8],
        ops: &dyn crate::identity::IdentityOps,
    ) -> Option<&NodeInfo> {
        if prefix.is_empty() {
            return None;
        }
        self.nodes.iter().find(|n| match n.pubkey {
            Some(key) => {
                let hash = ops.identity_hash(&key);
                let len = prefix.len().min(hash.len());
                hash[..len] == prefix[..len]
            }
            None => false,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Circular buffer of recent messages, oldest evicted first.
#[derive(Debug, Default)]
pub struct MessageHistory {
    ring: VecDeque<Message>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, msg: Message) {
        if self.ring.len() >= MESSAGE_HISTORY {
            self.ring.pop_front();
        }
        self.ring.push_back(msg);
    }

    /// Message by index, 0 = oldest retained.
    pub fn get(&self, index: usize) -> Option<&Message> {
        self.ring.get(index)
    }

    /// Mark the most recent undelivered outgoing message as delivered.
    /// Fallback for acks that match no pending slot.
    pub fn mark_latest_delivered(&mut self) {
        if let Some(msg) = self
            .ring
            .iter_mut()
            .rev()
            .find(|m| m.outgoing && !m.delivered)
        {
            msg.delivered = true;
        }
    }

    pub fn len(&self) -> usize {
        self.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

/// Channel repeat tracking — how far did our broadcast actually travel?
///
/// Every outgoing channel message is content-hashed and remembered for a
/// short window. When the network echoes it back (other nodes relaying
/// it), the echo is matched by hash and counted. Matching happens before
/// the transport's duplicate filter runs, or the evidence would be
/// discarded as a duplicate.
use crate::types::{CHANNEL_STATS_EXPIRY_MS, MAX_CHANNEL_STATS};

/// Content hash of a channel message: FNV-1a 32-bit over the channel index
/// then the text bytes.
///
/// The exact algorithm is a contract — the UI layer recomputes it to
/// correlate a locally sent message with later repeat-count updates, and
/// it is timestamp-independent so clock sync cannot break matching.
pub fn hash_channel_message(channel_idx: u8, text: &str) -> u32 {
    const PRIME: u32 = 0x0100_0193;
    let mut hash: u32 = 0x811C_9DC5;

    hash ^= channel_idx as u32;
    hash = hash.wrapping_mul(PRIME);

    for &b in text.as_bytes() {
        hash ^= b as u32;
        hash = hash.wrapping_mul(PRIME);
    }
    hash
}

#[derive(Debug, Clone)]
struct ChannelMsgStats {
    content_hash: u32,
    sent_at: u64,
    channel_idx: u8,
    repeat_count: u32,
}

impl ChannelMsgStats {
    fn expired(&self, now: u64) -> bool {
        now.saturating_sub(self.sent_at) > CHANNEL_STATS_EXPIRY_MS
    }
}

/// Fixed pool of repeat-stat slots for recently sent channel messages.
#[derive(Debug, Default)]
pub struct RepeatTracker {
    slots: [Option<ChannelMsgStats>; MAX_CHANNEL_STATS],
}

impl RepeatTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking an outgoing channel message in the first free or
    /// expired slot. Returns the content hash, or `None` when all slots
    /// hold live entries — unexpired entries are never evicted.
    pub fn track_sent(&mut self, channel_idx: u8, text: &str, now: u64) -> Option<u32> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_none_or(|st| st.expired(now)))?;

        let content_hash = hash_channel_message(channel_idx, text);
        *slot = Some(ChannelMsgStats {
            content_hash,
            sent_at: now,
            channel_idx,
            repeat_count: 0,
        });
        tracing::debug!(channel_idx, content_hash, "tracking sent channel message");
        Some(content_hash)
    }

    /// Record an observed echo of our own content. On a hash match to a
    /// live entry, increments and returns `(content_hash, new_count)`.
    pub fn check_repeat(&mut self, channel_idx: u8, text: &str, now: u64) -> Option<(u32, u32)> {
        let content_hash = hash_channel_message(channel_idx, text);
        let stats = self.slots.iter_mut().flatten().find(|s| {
            s.channel_idx == channel_idx && s.content_hash == content_hash && !s.expired(now)
        })?;

        stats.repeat_count += 1;
        tracing::debug!(
            channel_idx,
            content_hash,
            count = stats.repeat_count,
            "heard our channel message repeated"
        );
        Some((content_hash, stats.repeat_count))
    }

    /// Live (unexpired) tracked entries.
    pub fn live_count(&self, now: u64) -> usize {
        self.slots
            .iter()
            .flatten()
            .filter(|s| !s.expired(now))
            .count()
    }
}

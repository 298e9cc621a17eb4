/// Direct-message delivery: a small pool of in-flight sends with
/// acknowledgement matching and timeout-driven retries.
///
/// Pure decision logic in the router style — every operation returns
/// `DeliveryAction`s for the caller to execute against the transport.
/// Timeouts are polled: `check_timeouts` runs once per scheduler pass, so
/// retry latency is bounded below by the loop period.
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::path::{DmPeer, PeerTable};
use crate::types::{ContactId, PubKey, MAX_DM_TEXT, MAX_PENDING_DMS};
use crate::wire;

/// Terminal outcome of a tracked send, reported exactly once per message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub contact: ContactId,
    pub ack_tag: u32,
    pub delivered: bool,
    pub attempts: u8,
}

/// What the caller must do next.
#[derive(Debug)]
pub enum DeliveryAction {
    /// Encrypt `payload` for the contact and flood it.
    SendFlood { contact: ContactId, payload: Vec<u8> },
    /// Encrypt `payload` for the contact and send along `route`.
    SendDirect {
        contact: ContactId,
        payload: Vec<u8>,
        route: Vec<u8>,
    },
    /// Surface a delivery outcome to the host.
    Report(DeliveryReport),
}

#[derive(Debug, Clone)]
struct PendingDm {
    ack_tag: u32,
    contact: ContactId,
    sent_at: u64,
    deadline: u64,
    /// Retry-safe copy of the encoded payload.
    payload: Vec<u8>,
    attempts: u8,
    /// Route length at send time; feeds the retry ceiling.
    route_len: i8,
    is_flood: bool,
}

/// Fixed pool of in-flight direct messages.
#[derive(Debug, Default)]
pub struct DeliveryManager {
    slots: [Option<PendingDm>; MAX_PENDING_DMS],
}

impl DeliveryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track and build the initial send of a direct message.
    ///
    /// Chooses direct routing when the peer has a valid learned route,
    /// flood otherwise. Returns the expected ack tag plus the send action.
    /// Rejects empty text and refuses when all four slots are in flight —
    /// active sends are never disturbed.
    pub fn send(
        &mut self,
        peer: &DmPeer,
        text: &str,
        sender_pubkey: &PubKey,
        now: u64,
        cfg: &SessionConfig,
    ) -> Result<(u32, DeliveryAction), SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let slot = self
            .slots
            .iter()
            .position(|s| s.is_none())
            .ok_or(SessionError::NoFreeSlot)?;

        let text = wire::truncate_text(text, MAX_DM_TEXT);
        let timestamp = (now / 1000) as u32;
        let payload = wire::build_text(timestamp, wire::TXT_TYPE_PLAIN, text);
        let ack_tag = wire::ack_tag(timestamp, 0, text, sender_pubkey);

        let route = peer.valid_route(now).map(<[u8]>::to_vec);
        let (is_flood, route_len, action) = match route {
            Some(route) => (
                false,
                peer.route_len(),
                DeliveryAction::SendDirect {
                    contact: peer.contact,
                    payload: payload.clone(),
                    route,
                },
            ),
            None => (
                true,
                0,
                DeliveryAction::SendFlood {
                    contact: peer.contact,
                    payload: payload.clone(),
                },
            ),
        };

        tracing::debug!(
            contact = format_args!("{:08X}", peer.contact),
            ack_tag,
            flood = is_flood,
            "tracking direct message"
        );

        self.slots[slot] = Some(PendingDm {
            ack_tag,
            contact: peer.contact,
            sent_at: now,
            deadline: now + cfg.ack_timeout_ms,
            payload,
            attempts: 1,
            route_len,
            is_flood,
        });
        Ok((ack_tag, action))
    }

    /// Drive retries and failures. Call once per scheduler pass.
    ///
    /// A direct send that times out is retried once along its route, then
    /// switches to flood for the remaining attempts (the recipient may
    /// have no return path). Exhausted slots are freed, the contact's
    /// route invalidated, and exactly one failure report emitted.
    pub fn check_timeouts(
        &mut self,
        peers: &mut PeerTable,
        now: u64,
        cfg: &SessionConfig,
    ) -> Vec<DeliveryAction> {
        let mut actions = Vec::new();

        for slot in &mut self.slots {
            let Some(pending) = slot else { continue };
            if now < pending.deadline {
                continue;
            }

            let max_retries = cfg.max_retries(pending.is_flood, pending.route_len.max(0) as u8);
            if pending.attempts > max_retries {
                let report = DeliveryReport {
                    contact: pending.contact,
                    ack_tag: pending.ack_tag,
                    delivered: false,
                    attempts: pending.attempts,
                };
                tracing::info!(
                    contact = format_args!("{:08X}", report.contact),
                    attempts = report.attempts,
                    waited_ms = now.saturating_sub(pending.sent_at),
                    "delivery failed"
                );
                peers.invalidate_path(report.contact);
                *slot = None;
                actions.push(DeliveryAction::Report(report));
                continue;
            }

            // Retry. A direct send gets one more try along its route (if
            // still valid) at the shorter direct deadline; after that it
            // falls back to flood for good.
            let direct_route = (!pending.is_flood && pending.attempts == 1)
                .then(|| {
                    peers
                        .get(pending.contact)
                        .and_then(|p| p.valid_route(now))
                        .map(<[u8]>::to_vec)
                })
                .flatten();
            pending.attempts += 1;
            pending.sent_at = now;
            match direct_route {
                Some(route) => {
                    tracing::debug!(
                        contact = format_args!("{:08X}", pending.contact),
                        attempt = pending.attempts,
                        "direct send timed out, retrying via route"
                    );
                    pending.deadline = now + cfg.direct_retry_timeout_ms;
                    actions.push(DeliveryAction::SendDirect {
                        contact: pending.contact,
                        payload: pending.payload.clone(),
                        route,
                    });
                }
                None => {
                    tracing::debug!(
                        contact = format_args!("{:08X}", pending.contact),
                        attempt = pending.attempts,
                        flood = pending.is_flood,
                        "send timed out, retrying via flood"
                    );
                    pending.is_flood = true;
                    pending.deadline = now + cfg.flood_retry_timeout_ms;
                    actions.push(DeliveryAction::SendFlood {
                        contact: pending.contact,
                        payload: pending.payload.clone(),
                    });
                }
            }
        }
        actions
    }

    /// Match an acknowledgement against the pending pool.
    ///
    /// On a match the slot is freed and a success report returned; an
    /// already-acked tag matches nothing and has no effect.
    pub fn on_ack(&mut self, ack_tag: u32) -> Option<DeliveryReport> {
        let slot = self
            .slots
            .iter_mut()
            .find(|s| s.as_ref().is_some_and(|p| p.ack_tag == ack_tag))?;
        let pending = slot.take().expect("matched slot is occupied");
        tracing::info!(
            contact = format_args!("{:08X}", pending.contact),
            attempts = pending.attempts,
            "delivery confirmed"
        );
        Some(DeliveryReport {
            contact: pending.contact,
            ack_tag,
            delivered: true,
            attempts: pending.attempts,
        })
    }

    /// Contact owning a pending tag, if any. Used to learn routes from
    /// acks that carry path information.
    pub fn contact_for_tag(&self, ack_tag: u32) -> Option<ContactId> {
        self.slots
            .iter()
            .flatten()
            .find(|p| p.ack_tag == ack_tag)
            .map(|p| p.contact)
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    pub fn has_free_slot(&self) -> bool {
        self.slots.iter().any(|s| s.is_none())
    }
}

use crate::companion::{CompanionBridge, CompanionFrame, CompanionRequest, QueueOrigin};
use crate::config::SessionConfig;
use crate::delivery::{DeliveryAction, DeliveryManager};
use crate::directory::{Message, MessageHistory, NodeDirectory, NodeInfo};
use crate::error::SessionError;
use crate::identity::{has_pubkey, IdentityOps};
use crate::path::PeerTable;
use crate::repeat::RepeatTracker;
use crate::repeater::{RepeaterAction, RepeaterEvent, RepeaterSession, RepeaterState};
use crate::types::{contact_id_from_hash, ContactId, PubKey, MAX_DM_TEXT};
use crate::wire;

use super::effect::{Outbound, Route, SessionEffect};
use super::{PacketMeta, RouteKind, SessionEvent};

/// Etat complet du moteur de session — logique pure, zero async, zero
/// reseau. Les hooks de dispatch sont appeles par le transport sur la
/// boucle principale; `tick` est polle a chaque passe du scheduler.
pub struct SessionState {
    identity: Box<dyn IdentityOps>,
    config: SessionConfig,
    node_name: String,
    forwarding_enabled: bool,

    directory: NodeDirectory,
    history: MessageHistory,
    repeat: RepeatTracker,
    peers: PeerTable,
    delivery: DeliveryManager,
    repeater: RepeaterSession,
    companion: CompanionBridge,
}

impl SessionState {
    pub fn new(identity: Box<dyn IdentityOps>, config: SessionConfig) -> Self {
        Self {
            identity,
            config,
            node_name: "bramble".into(),
            forwarding_enabled: true,
            directory: NodeDirectory::new(),
            history: MessageHistory::new(),
            repeat: RepeatTracker::new(),
            peers: PeerTable::new(),
            delivery: DeliveryManager::new(),
            repeater: RepeaterSession::new(),
            companion: CompanionBridge::new(),
        }
    }

    pub fn node_name(&self) -> &str {
        &self.node_name
    }

    pub fn set_node_name(&mut self, name: &str) {
        self.node_name = name.into();
    }

    pub fn local_id(&self) -> ContactId {
        self.identity.local_id()
    }

    pub fn forwarding_enabled(&self) -> bool {
        self.forwarding_enabled
    }

    pub fn set_forwarding_enabled(&mut self, enabled: bool) {
        self.forwarding_enabled = enabled;
    }

    pub fn directory(&self) -> &NodeDirectory {
        &self.directory
    }

    pub fn history(&self) -> &MessageHistory {
        &self.history
    }

    pub fn repeater_state(&self) -> RepeaterState {
        self.repeater.state()
    }

    // ── Commands: messaging ──────────────────────────────────────────────

    /// Send an unencrypted broadcast to everyone in range.
    pub fn send_broadcast(
        &mut self,
        text: &str,
        now: u64,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let text = wire::truncate_text(text, MAX_DM_TEXT);
        let msg = Message {
            sender_id: 0,
            timestamp: (now / 1000) as u32,
            text: text.into(),
            outgoing: true,
            delivered: false,
        };
        self.history.push(msg.clone());
        tracing::info!(text, "broadcast sent");
        Ok(vec![
            SessionEffect::Send(Outbound::Broadcast {
                payload: text.as_bytes().to_vec(),
            }),
            SessionEffect::Emit(SessionEvent::MessageStored(msg)),
        ])
    }

    /// Send an encrypted message to a channel, tracked for repeat counting.
    pub fn send_channel_message(
        &mut self,
        channel_idx: u8,
        text: &str,
        now: u64,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        let text = wire::truncate_text(text, MAX_DM_TEXT.saturating_sub(self.node_name.len() + 2));
        let full = wire::format_sender_text(&self.node_name, text);
        let payload = wire::build_text((now / 1000) as u32, wire::TXT_TYPE_PLAIN, &full);

        // Tracked without the sender prefix; echoes are hashed the same way
        if self.repeat.track_sent(channel_idx, text, now).is_none() {
            tracing::debug!(channel_idx, "repeat tracker full, send not tracked");
        }

        let msg = Message {
            sender_id: 0,
            timestamp: (now / 1000) as u32,
            text: text.into(),
            outgoing: true,
            delivered: false,
        };
        self.history.push(msg.clone());
        tracing::info!(channel_idx, text, "channel message sent");
        Ok(vec![
            SessionEffect::Send(Outbound::ChannelText {
                channel_idx,
                payload,
            }),
            SessionEffect::Emit(SessionEvent::MessageStored(msg)),
        ])
    }

    /// Send an acknowledged direct message. Returns the ack tag the host
    /// can correlate with later `DeliveryStatus` events.
    pub fn send_direct_message(
        &mut self,
        contact: ContactId,
        text: &str,
        now: u64,
    ) -> Result<(u32, Vec<SessionEffect>), SessionError> {
        // Reject before any state mutation; the delivery pool checks this
        // too, but by then a peer slot may already have been taken.
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }
        if self.peers.get(contact).is_none() {
            let node = self
                .directory
                .get(contact)
                .ok_or(SessionError::UnknownContact(contact))?;
            let pubkey = node.pubkey.ok_or(SessionError::MissingPublicKey)?;
            self.peers
                .find_or_create(contact, &pubkey, self.identity.as_ref())?;
        }
        let local_key = self.identity.local_pubkey();
        let peer = self.peers.get(contact).expect("peer ensured above");
        let (ack_tag, action) = self.delivery.send(peer, text, &local_key, now, &self.config)?;
        Ok((ack_tag, self.delivery_effects(vec![action])))
    }

    /// Flood our identity advertisement.
    pub fn send_advert(&mut self) -> Vec<SessionEffect> {
        let app_data = wire::build_advert(crate::types::NodeType::Chat, &self.node_name, None);
        tracing::info!(name = %self.node_name, "advertisement sent");
        vec![SessionEffect::Send(Outbound::Advert { app_data })]
    }

    // ── Commands: repeater administration ────────────────────────────────

    pub fn repeater_login(
        &mut self,
        contact: ContactId,
        pubkey: &PubKey,
        password: &str,
        now: u64,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let action = self
            .repeater
            .login(contact, pubkey, password, now, self.identity.as_ref())?;
        Ok(vec![Self::repeater_effect(action)])
    }

    pub fn repeater_command(
        &mut self,
        text: &str,
        now: u64,
    ) -> Result<Vec<SessionEffect>, SessionError> {
        let action = self.repeater.send_command(text, now)?;
        Ok(vec![Self::repeater_effect(action)])
    }

    pub fn repeater_disconnect(&mut self) {
        self.repeater.disconnect();
    }

    fn repeater_effect(action: RepeaterAction) -> SessionEffect {
        match action {
            RepeaterAction::SendLogin {
                pubkey,
                secret,
                payload,
            } => SessionEffect::Send(Outbound::AnonRequest {
                pubkey,
                secret,
                payload,
            }),
            RepeaterAction::SendCommand {
                pubkey,
                secret,
                payload,
            } => SessionEffect::Send(Outbound::PeerText {
                pubkey,
                secret,
                payload,
                route: Route::Flood,
            }),
        }
    }

    // ── Commands: companion bridge ───────────────────────────────────────

    pub fn companion_set_connected(&mut self, connected: bool) {
        self.companion.set_connected(connected);
    }

    pub fn companion_connected(&self) -> bool {
        self.companion.is_connected()
    }

    /// Parse and dispatch one inbound companion frame.
    pub fn companion_frame(&mut self, bytes: &[u8], now: u64) -> Vec<SessionEffect> {
        let request = match crate::companion::decode_request(bytes) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "bad companion frame");
                return Self::companion_reply(&CompanionFrame::Error {
                    message: "bad frame".into(),
                })
                .into_iter()
                .collect();
            }
        };

        match request {
            CompanionRequest::SendChannelMessage { channel_idx, text } => {
                let sent = self.send_channel_message(channel_idx, &text, now);
                self.with_send_result(sent.map(|e| (None, e)))
            }
            CompanionRequest::SendDirectMessage { contact, text } => {
                let sent = self
                    .send_direct_message(contact, &text, now)
                    .map(|(tag, effects)| (Some(tag), effects));
                self.with_send_result(sent)
            }
            CompanionRequest::FetchContacts => {
                self.companion.start_contact_sync();
                Vec::new()
            }
            CompanionRequest::FetchDeviceInfo => Self::companion_reply(&CompanionFrame::DeviceInfo {
                node_id: self.identity.local_id(),
                name: self.node_name.clone(),
                forwarding: self.forwarding_enabled,
            })
            .into_iter()
            .collect(),
            CompanionRequest::SetForwarding { enabled } => {
                self.forwarding_enabled = enabled;
                self.with_send_result(Ok((None, Vec::new())))
            }
            CompanionRequest::SendAdvert => {
                let effects = self.send_advert();
                self.with_send_result(Ok((None, effects)))
            }
        }
    }

    /// One bridge output per scheduler pass: offline backlog first, then
    /// the next contact of an active sync.
    pub fn companion_poll(&mut self) -> Vec<SessionEffect> {
        self.companion
            .poll(&self.directory)
            .map(SessionEffect::CompanionWrite)
            .into_iter()
            .collect()
    }

    fn companion_reply(frame: &CompanionFrame) -> Option<SessionEffect> {
        crate::companion::encode_frame(frame)
            .ok()
            .map(SessionEffect::CompanionWrite)
    }

    fn with_send_result(
        &mut self,
        sent: Result<(Option<u32>, Vec<SessionEffect>), SessionError>,
    ) -> Vec<SessionEffect> {
        match sent {
            Ok((ack_tag, mut effects)) => {
                effects.extend(Self::companion_reply(&CompanionFrame::SendResult {
                    ok: true,
                    ack_tag,
                }));
                effects
            }
            Err(e) => {
                tracing::debug!(error = %e, "companion request failed");
                Self::companion_reply(&CompanionFrame::SendResult {
                    ok: false,
                    ack_tag: None,
                })
                .into_iter()
                .collect()
            }
        }
    }

    // ── Dispatch hooks (called by the transport layer) ───────────────────

    /// Advertisement received: update the node directory and remember the
    /// sender's public key for direct messaging and repeater login.
    pub fn handle_advert(
        &mut self,
        pubkey: &PubKey,
        timestamp: u32,
        app_data: &[u8],
        meta: &PacketMeta,
    ) -> Vec<SessionEffect> {
        let Some(advert) = wire::parse_advert(app_data) else {
            tracing::warn!("malformed advertisement dropped");
            return Vec::new();
        };

        let hash = self.identity.identity_hash(pubkey);
        let node = NodeInfo {
            id: contact_id_from_hash(&hash),
            name: if advert.name.is_empty() {
                "Unknown".into()
            } else {
                advert.name
            },
            node_type: advert.node_type,
            rssi: meta.rssi,
            snr: meta.snr,
            last_heard: timestamp,
            location: advert.location,
            pubkey: has_pubkey(pubkey).then_some(*pubkey),
        };

        if !self.directory.upsert(node.clone()) {
            tracing::debug!(id = format_args!("{:08X}", node.id), "node table full");
            return Vec::new();
        }
        tracing::debug!(id = format_args!("{:08X}", node.id), name = %node.name, "node heard");
        vec![SessionEffect::Emit(SessionEvent::NodeDiscovered(node))]
    }

    /// Unauthenticated data: a login response while one is pending, or a
    /// plain broadcast message.
    pub fn handle_anon_data(
        &mut self,
        sender_pubkey: &PubKey,
        payload_type: u8,
        data: &[u8],
        now: u64,
    ) -> Vec<SessionEffect> {
        if payload_type == wire::PAYLOAD_RESPONSE
            && self.repeater.state() == RepeaterState::LoginPending
        {
            return self.login_response(data);
        }

        let hash = self.identity.identity_hash(sender_pubkey);
        let msg = Message {
            sender_id: contact_id_from_hash(&hash),
            timestamp: (now / 1000) as u32,
            text: String::from_utf8_lossy(data).into_owned(),
            outgoing: false,
            delivered: true,
        };
        tracing::debug!(
            sender = format_args!("{:08X}", msg.sender_id),
            "broadcast received"
        );
        self.history.push(msg.clone());
        vec![SessionEffect::Emit(SessionEvent::MessageStored(msg))]
    }

    /// Priority interception, called for every direct-routed packet
    /// addressed to us before the transport's own early return would
    /// swallow it. Extracts acknowledgements (bare or multipart-wrapped);
    /// anything else defers to the transport's default handling.
    pub fn intercept_packet(
        &mut self,
        payload_type: u8,
        payload: &[u8],
        now: u64,
    ) -> Vec<SessionEffect> {
        match payload_type {
            wire::PAYLOAD_ACK if payload.len() >= 4 => {
                let tag = u32::from_le_bytes([payload[0], payload[1], payload[2], payload[3]]);
                tracing::debug!(tag, "direct ack intercepted");
                self.handle_ack(tag, None, now)
            }
            wire::PAYLOAD_MULTIPART if payload.len() >= 5 => {
                if payload[0] & 0x0F != wire::PAYLOAD_ACK {
                    return Vec::new();
                }
                let tag = u32::from_le_bytes([payload[1], payload[2], payload[3], payload[4]]);
                tracing::debug!(tag, "direct multipart ack intercepted");
                self.handle_ack(tag, None, now)
            }
            _ => Vec::new(),
        }
    }

    /// Acknowledgement received. `path` carries route information when the
    /// ack travelled with one (path-return packets).
    pub fn handle_ack(
        &mut self,
        ack_tag: u32,
        path: Option<&[u8]>,
        now: u64,
    ) -> Vec<SessionEffect> {
        if let Some(contact) = self.delivery.contact_for_tag(ack_tag) {
            if let Some(path) = path.filter(|p| !p.is_empty()) {
                self.peers.learn_path(contact, path, now);
            }
        }
        match self.delivery.on_ack(ack_tag) {
            Some(report) => vec![SessionEffect::Emit(SessionEvent::DeliveryStatus {
                contact: report.contact,
                ack_tag: report.ack_tag,
                delivered: report.delivered,
                attempts: report.attempts,
            })],
            None => {
                // No pending slot: fall back to flagging the latest
                // outgoing history entry.
                self.history.mark_latest_delivered();
                Vec::new()
            }
        }
    }

    /// Decrypted channel message received (post-dedup path).
    pub fn handle_group_data(
        &mut self,
        channel_idx: u8,
        data: &[u8],
        meta: &PacketMeta,
    ) -> Vec<SessionEffect> {
        let Some(payload) = wire::parse_text(data) else {
            tracing::warn!(channel_idx, "malformed channel payload dropped");
            return Vec::new();
        };
        if payload.txt_type != wire::TXT_TYPE_PLAIN {
            return Vec::new();
        }

        let (sender, text) = wire::split_sender_text(&payload.text);
        let sender = sender.unwrap_or("").to_string();
        let mut effects = vec![SessionEffect::Emit(SessionEvent::ChannelMessageReceived {
            channel_idx,
            sender: sender.clone(),
            text: text.to_string(),
            timestamp: payload.timestamp,
            hops: meta.hops(),
        })];

        let msg = Message {
            sender_id: 0,
            timestamp: payload.timestamp,
            text: payload.text.clone(),
            outgoing: false,
            delivered: true,
        };
        self.history.push(msg.clone());
        effects.push(SessionEffect::Emit(SessionEvent::MessageStored(msg)));

        let frame = CompanionFrame::ChannelMessage {
            channel_idx,
            sender,
            text: text.to_string(),
            timestamp: payload.timestamp,
            hops: meta.hops(),
        };
        if let Some(bytes) = self.companion.notify(&frame, QueueOrigin::Channel) {
            effects.push(SessionEffect::CompanionWrite(bytes));
        }
        effects
    }

    /// Pre-dedup observation of a flooded channel message. Called before
    /// the transport's duplicate filter so that echoes of our own messages
    /// still reach the repeat tracker; the packet itself is never
    /// filtered here.
    pub fn handle_flood_preview(
        &mut self,
        channel_idx: u8,
        data: &[u8],
        now: u64,
    ) -> Vec<SessionEffect> {
        let Some(payload) = wire::parse_text(data) else {
            return Vec::new();
        };
        if payload.txt_type != wire::TXT_TYPE_PLAIN {
            return Vec::new();
        }
        let (sender, text) = wire::split_sender_text(&payload.text);
        if sender != Some(self.node_name.as_str()) {
            return Vec::new();
        }
        match self.repeat.check_repeat(channel_idx, text, now) {
            Some((content_hash, count)) => {
                vec![SessionEffect::Emit(SessionEvent::RepeatCountUpdated {
                    channel_idx,
                    content_hash,
                    count,
                })]
            }
            None => Vec::new(),
        }
    }

    /// Resolve the shared secret for a packet's destination hash so the
    /// transport can decrypt: the repeater session first, then DM peers,
    /// then a lazy peer created from the directory.
    pub fn peer_secret(&mut self, hash: &[u8]) -> Option<crate::types::SharedSecret> {
        if self.repeater.matches(hash) {
            return self.repeater.secret();
        }
        if let Some(peer) = self.peers.find_by_hash(hash) {
            return Some(peer.secret);
        }
        // Unknown peer: a contact we heard an advertisement from may be
        // messaging us for the first time.
        let node = self.directory.find_by_hash(hash, self.identity.as_ref())?;
        let (contact, pubkey) = (node.id, node.pubkey?);
        match self
            .peers
            .find_or_create(contact, &pubkey, self.identity.as_ref())
        {
            Ok(peer) => Some(peer.secret),
            Err(e) => {
                tracing::debug!(error = %e, "cannot create peer for inbound data");
                None
            }
        }
    }

    /// Authenticated peer data: repeater traffic or a direct message,
    /// disambiguated by which table matched the hash.
    pub fn handle_peer_data(
        &mut self,
        hash: &[u8],
        payload_type: u8,
        data: &[u8],
        meta: &PacketMeta,
        now: u64,
    ) -> Vec<SessionEffect> {
        if self.repeater.matches(hash) {
            return self.repeater_data(payload_type, data);
        }

        let Some((contact, pubkey, secret)) = self
            .peers
            .find_by_hash(hash)
            .map(|p| (p.contact, p.identity.pubkey, p.secret))
        else {
            tracing::debug!("peer data with unmatched hash dropped");
            return Vec::new();
        };

        if payload_type != wire::PAYLOAD_TXT_MSG {
            return Vec::new();
        }
        let Some(payload) = wire::parse_text(data) else {
            tracing::warn!("malformed DM payload dropped");
            return Vec::new();
        };
        if payload.txt_type != wire::TXT_TYPE_PLAIN {
            return Vec::new();
        }

        // A flood DM carries the route it took; the reverse works for us.
        if meta.route == RouteKind::Flood && !meta.path.is_empty() {
            self.peers.learn_path(contact, &meta.path, now);
        }

        let sender = self.directory.name_of(contact);
        tracing::info!(
            contact = format_args!("{contact:08X}"),
            sender = %sender,
            "direct message received"
        );
        let mut effects = vec![SessionEffect::Emit(SessionEvent::DirectMessageReceived {
            contact,
            sender: sender.clone(),
            text: payload.text.clone(),
            timestamp: payload.timestamp,
        })];

        let frame = CompanionFrame::DirectMessage {
            contact,
            sender,
            text: payload.text.clone(),
            timestamp: payload.timestamp,
        };
        if let Some(bytes) = self.companion.notify(&frame, QueueOrigin::Direct) {
            effects.push(SessionEffect::CompanionWrite(bytes));
        }

        // Acknowledge: the sender computes the same tag over the same
        // inputs, so nothing but the tag needs to travel back.
        let tag = wire::ack_tag(payload.timestamp, payload.attempt, &payload.text, &pubkey);
        let ack = if meta.route == RouteKind::Flood {
            Outbound::PathReturnAck {
                pubkey,
                secret,
                path: meta.path.clone(),
                tag,
            }
        } else {
            Outbound::Ack { tag }
        };
        effects.push(SessionEffect::Send(ack));
        effects
    }

    /// Path-return received: may embed a login response or an ack, and
    /// always teaches us a route to the sender.
    pub fn handle_path_return(
        &mut self,
        hash: &[u8],
        path: &[u8],
        extra_type: u8,
        extra: &[u8],
        now: u64,
    ) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        if extra_type == wire::PAYLOAD_RESPONSE
            && self.repeater.state() == RepeaterState::LoginPending
            && self.repeater.matches(hash)
        {
            return self.login_response(extra);
        }

        if extra_type == wire::PAYLOAD_ACK && extra.len() >= 4 {
            let tag = u32::from_le_bytes([extra[0], extra[1], extra[2], extra[3]]);
            effects.extend(self.handle_ack(tag, Some(path), now));
        }

        if !path.is_empty() {
            if let Some(contact) = self.peers.find_by_hash(hash).map(|p| p.contact) {
                self.peers.learn_path(contact, path, now);
            }
        }
        effects
    }

    /// Forward-permission query from the transport. Direct-routed packets
    /// follow explicit paths and are always forwarded; flood traffic is
    /// gated by the relay flag.
    pub fn allow_forward(&self, route: RouteKind) -> bool {
        route == RouteKind::Direct || self.forwarding_enabled
    }

    // ── Tick ─────────────────────────────────────────────────────────────

    /// Polled once per scheduler pass: login timeout and DM retries.
    /// Retry latency is bounded below by the loop period.
    pub fn tick(&mut self, now: u64) -> Vec<SessionEffect> {
        let mut effects = Vec::new();

        if let Some(event) = self.repeater.check_timeout(now, &self.config) {
            effects.push(Self::repeater_event(event));
        }

        let actions = self
            .delivery
            .check_timeouts(&mut self.peers, now, &self.config);
        effects.extend(self.delivery_effects(actions));
        effects
    }

    // ── Internal ─────────────────────────────────────────────────────────

    fn login_response(&mut self, data: &[u8]) -> Vec<SessionEffect> {
        let name = self
            .repeater
            .contact()
            .map(|c| self.directory.name_of(c))
            .unwrap_or_default();
        match self.repeater.handle_login_response(data, name) {
            Some(event) => vec![Self::repeater_event(event)],
            None => Vec::new(),
        }
    }

    fn repeater_data(&mut self, payload_type: u8, data: &[u8]) -> Vec<SessionEffect> {
        match payload_type {
            wire::PAYLOAD_RESPONSE => self.login_response(data),
            wire::PAYLOAD_TXT_MSG => {
                let Some(payload) = wire::parse_text(data) else {
                    return Vec::new();
                };
                if payload.txt_type != wire::TXT_TYPE_CLI_DATA
                    && payload.txt_type != wire::TXT_TYPE_PLAIN
                {
                    return Vec::new();
                }
                match self.repeater.handle_cli_response(payload.text) {
                    Some(event) => vec![Self::repeater_event(event)],
                    None => Vec::new(),
                }
            }
            _ => Vec::new(),
        }
    }

    fn repeater_event(event: RepeaterEvent) -> SessionEffect {
        match event {
            RepeaterEvent::LoginResult {
                success,
                permissions,
                name,
            } => SessionEffect::Emit(SessionEvent::LoginResult {
                success,
                permissions,
                name,
            }),
            RepeaterEvent::CliResponse { text } => {
                SessionEffect::Emit(SessionEvent::CliResponse { text })
            }
        }
    }

    fn delivery_effects(&self, actions: Vec<DeliveryAction>) -> Vec<SessionEffect> {
        let mut effects = Vec::new();
        for action in actions {
            match action {
                DeliveryAction::SendFlood { contact, payload } => {
                    match self.peers.get(contact) {
                        Some(peer) => effects.push(SessionEffect::Send(Outbound::PeerText {
                            pubkey: peer.identity.pubkey,
                            secret: peer.secret,
                            payload,
                            route: Route::Flood,
                        })),
                        None => tracing::warn!(
                            contact = format_args!("{contact:08X}"),
                            "resend for unknown peer dropped"
                        ),
                    }
                }
                DeliveryAction::SendDirect {
                    contact,
                    payload,
                    route,
                } => match self.peers.get(contact) {
                    Some(peer) => effects.push(SessionEffect::Send(Outbound::PeerText {
                        pubkey: peer.identity.pubkey,
                        secret: peer.secret,
                        payload,
                        route: Route::Direct { path: route },
                    })),
                    None => tracing::warn!(
                        contact = format_args!("{contact:08X}"),
                        "direct send for unknown peer dropped"
                    ),
                },
                DeliveryAction::Report(report) => {
                    effects.push(SessionEffect::Emit(SessionEvent::DeliveryStatus {
                        contact: report.contact,
                        ack_tag: report.ack_tag,
                        delivered: report.delivered,
                        attempts: report.attempts,
                    }))
                }
            }
        }
        effects
    }
}

/// End-to-end session scenarios against a fake transport identity:
/// delivery with retry and path learning, repeat counting, admission
/// limits, repeater administration, companion backlog drain.
use bramble_session::{
    hash_channel_message, wire, CompanionFrame, CompanionRequest, ContactId, IdentityOps,
    NodeType, Outbound, PacketMeta, PubKey, Route, RepeaterState, SessionConfig, SessionEffect,
    SessionEvent, SessionState, SharedSecret,
};

/// Deterministic stand-in for the transport's identity layer.
struct TestIdentity {
    pubkey: PubKey,
}

impl TestIdentity {
    fn new(seed: u8) -> Self {
        Self { pubkey: [seed; 32] }
    }
}

impl IdentityOps for TestIdentity {
    fn local_id(&self) -> ContactId {
        u32::from_le_bytes([self.pubkey[0]; 4])
    }

    fn local_pubkey(&self) -> PubKey {
        self.pubkey
    }

    fn identity_hash(&self, pubkey: &PubKey) -> [u8; 8] {
        let mut hash = [0u8; 8];
        hash.copy_from_slice(&pubkey[..8]);
        hash
    }

    fn shared_secret(&self, pubkey: &PubKey) -> SharedSecret {
        let mut secret = [0u8; 32];
        for (i, b) in secret.iter_mut().enumerate() {
            *b = pubkey[i] ^ self.pubkey[i];
        }
        secret
    }
}

fn engine() -> SessionState {
    let _ = tracing_subscriber::fmt().with_env_filter("warn").try_init();
    let mut state = SessionState::new(
        Box::new(TestIdentity::new(1)),
        SessionConfig::default(),
    );
    state.set_node_name("basecamp");
    state
}

fn peer_key(seed: u8) -> PubKey {
    [seed; 32]
}

fn peer_id(seed: u8) -> ContactId {
    u32::from_le_bytes([seed; 4])
}

/// Advertise a peer so the engine knows its key.
fn hear(state: &mut SessionState, seed: u8, name: &str, node_type: NodeType) {
    let app_data = wire::build_advert(node_type, name, None);
    let effects = state.handle_advert(&peer_key(seed), 100, &app_data, &PacketMeta::flood(vec![]));
    assert!(!effects.is_empty(), "advert for {name} was dropped");
}

fn events(effects: &[SessionEffect]) -> Vec<SessionEvent> {
    effects
        .iter()
        .filter_map(|e| match e {
            SessionEffect::Emit(event) => Some(event.clone()),
            _ => None,
        })
        .collect()
}

// ── Delivery ───────────────────────────────────────────────────────────

#[test]
fn delivery_learns_path_from_ack_and_goes_direct() {
    let mut state = engine();
    hear(&mut state, 0xAA, "alice", NodeType::Chat);

    // First send has no route: flood
    let (tag, effects) = state.send_direct_message(peer_id(0xAA), "hello", 10_000).unwrap();
    assert!(matches!(
        effects[0],
        SessionEffect::Send(Outbound::PeerText { route: Route::Flood, .. })
    ));

    // Ack arrives as a path-return carrying the route back to alice
    let effects = state.handle_path_return(
        &[0xAA; 8],
        &[7, 8, 9],
        wire::PAYLOAD_ACK,
        &tag.to_le_bytes(),
        12_000,
    );
    assert!(events(&effects).iter().any(|e| matches!(
        e,
        SessionEvent::DeliveryStatus { delivered: true, attempts: 1, ack_tag, .. } if *ack_tag == tag
    )));

    // Second send uses the learned route
    let (_, effects) = state.send_direct_message(peer_id(0xAA), "again", 13_000).unwrap();
    match &effects[0] {
        SessionEffect::Send(Outbound::PeerText { route: Route::Direct { path }, .. }) => {
            assert_eq!(path, &vec![7, 8, 9]);
        }
        other => panic!("expected direct send, got {other:?}"),
    }
}

#[test]
fn retry_exhaustion_fails_once_and_invalidates_route() {
    let mut state = engine();
    let cfg = SessionConfig::default();
    hear(&mut state, 0xAA, "alice", NodeType::Chat);

    let (tag, _) = state.send_direct_message(peer_id(0xAA), "anyone there?", 0).unwrap();

    let mut now = 0;
    let mut resends = 0;
    let mut failures = Vec::new();
    for _ in 0..12 {
        now += cfg.ack_timeout_ms + cfg.flood_retry_timeout_ms;
        for effect in state.tick(now) {
            match effect {
                SessionEffect::Send(Outbound::PeerText { .. }) => resends += 1,
                SessionEffect::Emit(SessionEvent::DeliveryStatus {
                    delivered,
                    attempts,
                    ack_tag,
                    ..
                }) => {
                    assert!(!delivered);
                    assert_eq!(ack_tag, tag);
                    failures.push(attempts);
                }
                other => panic!("unexpected effect {other:?}"),
            }
        }
    }

    assert_eq!(resends, cfg.flood_max_retries as usize);
    // Exactly one terminal failure, after 1 + retries attempts
    assert_eq!(failures, vec![cfg.flood_max_retries + 1]);

    // A late ack for the abandoned send matches nothing
    assert!(state.handle_ack(tag, None, now + 1).is_empty());
}

#[test]
fn fifth_concurrent_send_is_rejected() {
    let mut state = engine();
    hear(&mut state, 0xAA, "alice", NodeType::Chat);

    let mut tags = Vec::new();
    for i in 0..4u64 {
        let (tag, _) = state
            .send_direct_message(peer_id(0xAA), &format!("msg {i}"), 1000 + i)
            .unwrap();
        tags.push(tag);
    }
    assert!(state.send_direct_message(peer_id(0xAA), "one too many", 1005).is_err());

    // The four in-flight sends are untouched and still ack-able
    for tag in tags {
        let effects = state.handle_ack(tag, None, 2000);
        assert!(matches!(
            events(&effects)[0],
            SessionEvent::DeliveryStatus { delivered: true, .. }
        ));
    }
}

// ── Channel repeat tracking ────────────────────────────────────────────

#[test]
fn repeat_counts_three_echoes_then_expires() {
    let mut state = engine();
    state.send_channel_message(0, "hi", 0).unwrap();

    let echo = wire::build_text(1, wire::TXT_TYPE_PLAIN, "basecamp: hi");
    let expected_hash = hash_channel_message(0, "hi");

    for (i, at) in [10_000u64, 20_000, 30_000].iter().enumerate() {
        let effects = state.handle_flood_preview(0, &echo, *at);
        let evts = events(&effects);
        assert_eq!(evts.len(), 1, "echo {i} should emit exactly one event");
        assert!(matches!(
            &evts[0],
            SessionEvent::RepeatCountUpdated { channel_idx: 0, content_hash, count }
                if *content_hash == expected_hash && *count == (i as u32 + 1)
        ));
    }

    // Fourth echo after the 60 s window: expired, no count
    assert!(state.handle_flood_preview(0, &echo, 61_001).is_empty());
}

// ── Repeater administration ────────────────────────────────────────────

#[test]
fn repeater_admin_full_cycle() {
    let mut state = engine();
    hear(&mut state, 0x42, "hilltop", NodeType::Repeater);

    let effects = state
        .repeater_login(peer_id(0x42), &peer_key(0x42), "hunter2", 1000)
        .unwrap();
    match &effects[0] {
        SessionEffect::Send(Outbound::AnonRequest { payload, .. }) => {
            assert_eq!(&payload[4..], b"hunter2");
        }
        other => panic!("expected anon login request, got {other:?}"),
    }

    // Response arrives embedded in a path-return packet
    let response = [0, 0, 0, 0, wire::RESP_LOGIN_OK, 1, 1, 2];
    let effects = state.handle_path_return(&[0x42; 8], &[5], wire::PAYLOAD_RESPONSE, &response, 2000);
    assert!(matches!(
        &events(&effects)[0],
        SessionEvent::LoginResult { success: true, permissions: 2, name } if name == "hilltop"
    ));
    assert_eq!(state.repeater_state(), RepeaterState::Connected);

    // Command out, response in
    state.repeater_command("reboot", 3000).unwrap();
    let cli = wire::build_text(4, wire::TXT_TYPE_CLI_DATA, "rebooting");
    let effects = state.handle_peer_data(
        &[0x42; 8],
        wire::PAYLOAD_TXT_MSG,
        &cli,
        &PacketMeta::flood(vec![]),
        4000,
    );
    assert!(matches!(
        &events(&effects)[0],
        SessionEvent::CliResponse { text } if text == "rebooting"
    ));

    state.repeater_disconnect();
    assert_eq!(state.repeater_state(), RepeaterState::Disconnected);
    assert!(state.repeater_command("status", 5000).is_err());
}

#[test]
fn dm_traffic_still_flows_while_repeater_connected() {
    let mut state = engine();
    hear(&mut state, 0x42, "hilltop", NodeType::Repeater);
    hear(&mut state, 0xAA, "alice", NodeType::Chat);

    state
        .repeater_login(peer_id(0x42), &peer_key(0x42), "pw", 1000)
        .unwrap();
    let response = [0, 0, 0, 0, wire::RESP_LOGIN_OK, 1, 0, 1];
    state.handle_anon_data(&peer_key(0x42), wire::PAYLOAD_RESPONSE, &response, 2000);

    // A DM from alice is dispatched to the peer table, not the session
    assert!(state.peer_secret(&[0xAA; 8]).is_some());
    let dm = wire::build_text(9, wire::TXT_TYPE_PLAIN, "lunch?");
    let effects = state.handle_peer_data(
        &[0xAA; 8],
        wire::PAYLOAD_TXT_MSG,
        &dm,
        &PacketMeta::flood(vec![1]),
        3000,
    );
    assert!(matches!(
        &events(&effects)[0],
        SessionEvent::DirectMessageReceived { sender, .. } if sender == "alice"
    ));
}

// ── Companion bridge ───────────────────────────────────────────────────

#[test]
fn offline_backlog_drains_in_order_then_contacts_sync() {
    let mut state = engine();
    hear(&mut state, 0xAA, "alice", NodeType::Chat);

    // Two notifications while the link is down
    let ch = wire::build_text(5, wire::TXT_TYPE_PLAIN, "ridge: storm");
    state.handle_group_data(0, &ch, &PacketMeta::flood(vec![1]));

    assert!(state.peer_secret(&[0xAA; 8]).is_some());
    let dm = wire::build_text(6, wire::TXT_TYPE_PLAIN, "you up?");
    state.handle_peer_data(
        &[0xAA; 8],
        wire::PAYLOAD_TXT_MSG,
        &dm,
        &PacketMeta::flood(vec![]),
        7000,
    );

    state.companion_set_connected(true);
    let request = rmp_serde::to_vec(&CompanionRequest::FetchContacts).unwrap();
    state.companion_frame(&request, 8000);

    // Backlog first, in arrival order, one frame per poll
    let mut frames = Vec::new();
    loop {
        let effects = state.companion_poll();
        if effects.is_empty() {
            break;
        }
        let SessionEffect::CompanionWrite(bytes) = &effects[0] else {
            panic!("expected companion write");
        };
        frames.push(rmp_serde::from_slice::<CompanionFrame>(bytes).unwrap());
    }

    assert!(matches!(&frames[0], CompanionFrame::ChannelMessage { sender, .. } if sender == "ridge"));
    assert!(matches!(&frames[1], CompanionFrame::DirectMessage { text, .. } if text == "you up?"));
    assert!(matches!(&frames[2], CompanionFrame::Contact { name, .. } if name == "alice"));
    assert!(matches!(frames[3], CompanionFrame::ContactSyncDone { count: 1 }));
}

#[test]
fn companion_can_drive_a_send() {
    let mut state = engine();
    hear(&mut state, 0xAA, "alice", NodeType::Chat);
    state.companion_set_connected(true);

    let request = rmp_serde::to_vec(&CompanionRequest::SendDirectMessage {
        contact: peer_id(0xAA),
        text: "from the app".into(),
    })
    .unwrap();
    let effects = state.companion_frame(&request, 9000);

    let sent = effects
        .iter()
        .any(|e| matches!(e, SessionEffect::Send(Outbound::PeerText { .. })));
    assert!(sent);

    let result = effects
        .iter()
        .find_map(|e| match e {
            SessionEffect::CompanionWrite(bytes) => {
                rmp_serde::from_slice::<CompanionFrame>(bytes).ok()
            }
            _ => None,
        })
        .unwrap();
    assert!(matches!(result, CompanionFrame::SendResult { ok: true, ack_tag: Some(_) }));
}

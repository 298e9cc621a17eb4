/// Repeater administration session — a single-slot login/CLI state
/// machine for remotely managing one node on the mesh.
///
/// Disconnected → LoginPending → Connected → Disconnected. The login
/// request travels as an authenticated anonymous datagram (the repeater
/// does not know us yet); once connected, commands are ordinary encrypted
/// peer text marked as CLI data. Responses arrive through the peer-data
/// hook like any other peer traffic.
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::identity::{has_pubkey, IdentityOps, PeerIdentity};
use crate::types::{ContactId, PubKey, SharedSecret};
use crate::wire;

/// Observable session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeaterState {
    Disconnected,
    LoginPending,
    Connected,
}

/// Reported to the host through the session event stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepeaterEvent {
    LoginResult {
        success: bool,
        permissions: u8,
        name: String,
    },
    CliResponse {
        text: String,
    },
}

/// A packet the caller must send for the session.
#[derive(Debug)]
pub enum RepeaterAction {
    /// Flood an anonymous authenticated login request.
    SendLogin {
        pubkey: PubKey,
        secret: SharedSecret,
        payload: Vec<u8>,
    },
    /// Flood an encrypted CLI command to the session peer.
    SendCommand {
        pubkey: PubKey,
        secret: SharedSecret,
        payload: Vec<u8>,
    },
}

#[derive(Debug)]
struct ActiveSession {
    contact: ContactId,
    name: String,
    identity: PeerIdentity,
    secret: SharedSecret,
    permissions: u8,
    connected: bool,
    login_started: u64,
}

/// Singleton remote-administration session.
#[derive(Debug, Default)]
pub struct RepeaterSession {
    active: Option<ActiveSession>,
}

impl RepeaterSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RepeaterState {
        match &self.active {
            None => RepeaterState::Disconnected,
            Some(s) if s.connected => RepeaterState::Connected,
            Some(_) => RepeaterState::LoginPending,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state() == RepeaterState::Connected
    }

    /// Contact of the current session peer, in any non-disconnected state.
    pub fn contact(&self) -> Option<ContactId> {
        self.active.as_ref().map(|s| s.contact)
    }

    /// Whether a packet hash prefix addresses the session peer.
    pub fn matches(&self, prefix: &[u8]) -> bool {
        self.active
            .as_ref()
            .is_some_and(|s| s.identity.matches(prefix))
    }

    /// Shared secret for decrypting session traffic.
    pub fn secret(&self) -> Option<SharedSecret> {
        self.active.as_ref().map(|s| s.secret)
    }

    /// Start a login. Valid only while disconnected; fails fast when the
    /// target's public key has never been learned from an advertisement.
    pub fn login(
        &mut self,
        contact: ContactId,
        pubkey: &PubKey,
        password: &str,
        now: u64,
        ops: &dyn IdentityOps,
    ) -> Result<RepeaterAction, SessionError> {
        if self.active.is_some() {
            return Err(SessionError::SessionBusy);
        }
        if !has_pubkey(pubkey) {
            return Err(SessionError::MissingPublicKey);
        }

        let identity = PeerIdentity::new(*pubkey, ops);
        let secret = ops.shared_secret(pubkey);
        let payload = wire::build_login((now / 1000) as u32, password);

        tracing::info!(
            contact = format_args!("{contact:08X}"),
            "sending repeater login"
        );
        self.active = Some(ActiveSession {
            contact,
            name: String::new(),
            identity,
            secret,
            permissions: 0,
            connected: false,
            login_started: now,
        });
        Ok(RepeaterAction::SendLogin {
            pubkey: *pubkey,
            secret,
            payload,
        })
    }

    /// Feed a login response payload. `name` is the caller's best label
    /// for the peer (directory lookup). Returns the event to surface, or
    /// `None` when no login is pending.
    pub fn handle_login_response(&mut self, data: &[u8], name: String) -> Option<RepeaterEvent> {
        let session = self.active.as_mut().filter(|s| !s.connected)?;
        let response = wire::parse_login_response(data)?;

        if response.ok {
            session.connected = true;
            session.permissions = response.permissions;
            session.name = name;
            tracing::info!(
                name = %session.name,
                permissions = session.permissions,
                "repeater login successful"
            );
            Some(RepeaterEvent::LoginResult {
                success: true,
                permissions: session.permissions,
                name: session.name.clone(),
            })
        } else {
            tracing::info!("repeater login rejected");
            self.active = None;
            Some(RepeaterEvent::LoginResult {
                success: false,
                permissions: 0,
                name: String::new(),
            })
        }
    }

    /// CLI response text from the session peer. Ignored unless connected.
    pub fn handle_cli_response(&mut self, text: String) -> Option<RepeaterEvent> {
        let session = self.active.as_ref().filter(|s| s.connected)?;
        tracing::debug!(name = %session.name, "CLI response");
        Some(RepeaterEvent::CliResponse { text })
    }

    /// Wrap command text as an authenticated CLI payload to the peer.
    pub fn send_command(&mut self, text: &str, now: u64) -> Result<RepeaterAction, SessionError> {
        let session = self
            .active
            .as_ref()
            .filter(|s| s.connected)
            .ok_or(SessionError::NotConnected)?;
        if text.is_empty() {
            return Err(SessionError::EmptyMessage);
        }

        let payload = wire::build_text((now / 1000) as u32, wire::TXT_TYPE_CLI_DATA, text);
        tracing::debug!(name = %session.name, command = text, "sending CLI command");
        Ok(RepeaterAction::SendCommand {
            pubkey: session.identity.pubkey,
            secret: session.secret,
            payload,
        })
    }

    /// Fail a pending login that outlived the configured window.
    pub fn check_timeout(&mut self, now: u64, cfg: &SessionConfig) -> Option<RepeaterEvent> {
        let pending = self
            .active
            .as_ref()
            .filter(|s| !s.connected && now.saturating_sub(s.login_started) > cfg.login_timeout_ms)
            .is_some();
        if !pending {
            return None;
        }
        tracing::info!("repeater login timed out");
        self.active = None;
        Some(RepeaterEvent::LoginResult {
            success: false,
            permissions: 0,
            name: "timeout".into(),
        })
    }

    /// Tear the session down, from any state.
    pub fn disconnect(&mut self) {
        if self.active.take().is_some() {
            tracing::info!("disconnected from repeater");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::mock::{peer_key, MockIdentity};

    fn login_ok_payload(permissions: u8) -> Vec<u8> {
        vec![0, 0, 0, 0, wire::RESP_LOGIN_OK, 1, 1, permissions]
    }

    fn start_login(session: &mut RepeaterSession, ops: &MockIdentity) {
        session
            .login(0x42, &peer_key(0x42), "hunter2", 1000, ops)
            .unwrap();
    }

    #[test]
    fn full_login_cycle() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        assert_eq!(session.state(), RepeaterState::Disconnected);

        let action = session
            .login(0x42, &peer_key(0x42), "hunter2", 1000, &ops)
            .unwrap();
        assert_eq!(session.state(), RepeaterState::LoginPending);
        match action {
            RepeaterAction::SendLogin { payload, .. } => {
                assert_eq!(&payload[4..], b"hunter2");
            }
            other => panic!("expected SendLogin, got {other:?}"),
        }

        let event = session
            .handle_login_response(&login_ok_payload(3), "hilltop".into())
            .unwrap();
        assert_eq!(session.state(), RepeaterState::Connected);
        assert_eq!(
            event,
            RepeaterEvent::LoginResult {
                success: true,
                permissions: 3,
                name: "hilltop".into()
            }
        );
    }

    #[test]
    fn login_requires_disconnected_state() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        start_login(&mut session, &ops);

        let err = session
            .login(0x43, &peer_key(0x43), "pw", 1000, &ops)
            .unwrap_err();
        assert!(matches!(err, SessionError::SessionBusy));
    }

    #[test]
    fn login_needs_a_pubkey() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        let err = session.login(0x42, &[0u8; 32], "pw", 1000, &ops).unwrap_err();
        assert!(matches!(err, SessionError::MissingPublicKey));
        assert_eq!(session.state(), RepeaterState::Disconnected);
    }

    #[test]
    fn rejection_returns_to_disconnected() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        start_login(&mut session, &ops);

        let rejected = vec![0, 0, 0, 0, 2, 0, 0, 0];
        let event = session
            .handle_login_response(&rejected, "hilltop".into())
            .unwrap();
        assert_eq!(session.state(), RepeaterState::Disconnected);
        assert!(matches!(
            event,
            RepeaterEvent::LoginResult { success: false, .. }
        ));
    }

    #[test]
    fn login_timeout_fires_once() {
        let ops = MockIdentity::new(1);
        let cfg = SessionConfig::default();
        let mut session = RepeaterSession::new();
        start_login(&mut session, &ops);

        assert!(session.check_timeout(1000 + cfg.login_timeout_ms, &cfg).is_none());
        let event = session
            .check_timeout(1001 + cfg.login_timeout_ms, &cfg)
            .unwrap();
        assert!(matches!(
            event,
            RepeaterEvent::LoginResult { success: false, .. }
        ));
        assert_eq!(session.state(), RepeaterState::Disconnected);
        assert!(session
            .check_timeout(2000 + cfg.login_timeout_ms, &cfg)
            .is_none());
    }

    #[test]
    fn connected_session_never_times_out() {
        let ops = MockIdentity::new(1);
        let cfg = SessionConfig::default();
        let mut session = RepeaterSession::new();
        start_login(&mut session, &ops);
        session
            .handle_login_response(&login_ok_payload(1), "r".into())
            .unwrap();

        assert!(session.check_timeout(u64::MAX, &cfg).is_none());
        assert_eq!(session.state(), RepeaterState::Connected);
    }

    #[test]
    fn commands_require_connection() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        assert!(matches!(
            session.send_command("status", 1000),
            Err(SessionError::NotConnected)
        ));

        start_login(&mut session, &ops);
        assert!(matches!(
            session.send_command("status", 1000),
            Err(SessionError::NotConnected)
        ));

        session
            .handle_login_response(&login_ok_payload(1), "r".into())
            .unwrap();
        let action = session.send_command("status", 1000).unwrap();
        match action {
            RepeaterAction::SendCommand { payload, .. } => {
                let parsed = wire::parse_text(&payload).unwrap();
                assert_eq!(parsed.txt_type, wire::TXT_TYPE_CLI_DATA);
                assert_eq!(parsed.text, "status");
            }
            other => panic!("expected SendCommand, got {other:?}"),
        }
        assert!(matches!(
            session.send_command("", 1000),
            Err(SessionError::EmptyMessage)
        ));
    }

    #[test]
    fn cli_responses_only_while_connected() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        assert!(session.handle_cli_response("hi".into()).is_none());

        start_login(&mut session, &ops);
        assert!(session.handle_cli_response("hi".into()).is_none());

        session
            .handle_login_response(&login_ok_payload(1), "r".into())
            .unwrap();
        assert_eq!(
            session.handle_cli_response("uptime 4d".into()),
            Some(RepeaterEvent::CliResponse {
                text: "uptime 4d".into()
            })
        );
    }

    #[test]
    fn disconnect_from_any_state() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        session.disconnect(); // no-op

        start_login(&mut session, &ops);
        session.disconnect();
        assert_eq!(session.state(), RepeaterState::Disconnected);

        start_login(&mut session, &ops);
        session
            .handle_login_response(&login_ok_payload(1), "r".into())
            .unwrap();
        session.disconnect();
        assert_eq!(session.state(), RepeaterState::Disconnected);
        assert!(session.secret().is_none());
    }

    #[test]
    fn hash_matching_during_pending_login() {
        let ops = MockIdentity::new(1);
        let mut session = RepeaterSession::new();
        assert!(!session.matches(&[0x42]));

        start_login(&mut session, &ops);
        assert!(session.matches(&[0x42]));
        assert!(!session.matches(&[0x43]));
    }
}

/// Payload formats carried inside the transport's packets.
///
/// This core owns none of the outer wire framing — only the application
/// payloads: text datagrams, login requests/responses, advertisements, and
/// the ack-tag digest that correlates acknowledgements with sends.
use sha2::{Digest, Sha256};

use crate::types::{NodeType, PubKey};

// ── Transport payload-type codes ───────────────────────────────────────
// Assigned by the transport's packet header; this core only dispatches on
// them.

pub const PAYLOAD_RESPONSE: u8 = 0x01;
pub const PAYLOAD_TXT_MSG: u8 = 0x02;
pub const PAYLOAD_ACK: u8 = 0x03;
pub const PAYLOAD_GRP_TXT: u8 = 0x05;
pub const PAYLOAD_ANON_REQ: u8 = 0x07;
pub const PAYLOAD_MULTIPART: u8 = 0x0A;

// ── Text payloads: [timestamp(4 LE)][flags(1)][text] ──────────────────
// The flags byte packs the text type in bits 7:2 and the send attempt in
// bits 1:0.

pub const TXT_TYPE_PLAIN: u8 = 0;
pub const TXT_TYPE_CLI_DATA: u8 = 1;

/// Header bytes before the text of a text payload.
pub const TEXT_HEADER_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPayload {
    pub timestamp: u32,
    pub txt_type: u8,
    pub attempt: u8,
    pub text: String,
}

pub fn build_text(timestamp: u32, txt_type: u8, text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(TEXT_HEADER_LEN + text.len());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.push(txt_type << 2);
    out.extend_from_slice(text.as_bytes());
    out
}

/// Parse a text payload. Returns `None` when the header is incomplete;
/// non-UTF-8 text bytes are replaced rather than rejected (noise on the
/// air must never fault this core).
pub fn parse_text(data: &[u8]) -> Option<TextPayload> {
    if data.len() < TEXT_HEADER_LEN {
        return None;
    }
    let timestamp = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
    let flags = data[4];
    Some(TextPayload {
        timestamp,
        txt_type: flags >> 2,
        attempt: flags & 0x03,
        text: String::from_utf8_lossy(&data[TEXT_HEADER_LEN..]).into_owned(),
    })
}

/// Truncate text to at most `max` bytes without splitting a code point.
pub fn truncate_text(text: &str, max: usize) -> &str {
    if text.len() <= max {
        return text;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

// ── Ack tags ───────────────────────────────────────────────────────────

/// Acknowledgement tag for a direct message.
///
/// SHA-256 over `[timestamp(4 LE)][attempt & 3][text][sender pubkey(32)]`,
/// truncated to the first four bytes, little-endian. Sender and receiver
/// compute it independently over the same inputs, so no tag travels with
/// the message itself.
pub fn ack_tag(timestamp: u32, attempt: u8, text: &str, sender_pubkey: &PubKey) -> u32 {
    let mut hasher = Sha256::new();
    hasher.update(timestamp.to_le_bytes());
    hasher.update([attempt & 0x03]);
    hasher.update(text.as_bytes());
    hasher.update(sender_pubkey);
    let digest = hasher.finalize();
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

// ── "Sender: text" channel convention ──────────────────────────────────

pub fn format_sender_text(sender: &str, text: &str) -> String {
    format!("{sender}: {text}")
}

/// Split the channel convention back apart. Without a ": " separator the
/// whole string is the text and the sender is unknown.
pub fn split_sender_text(s: &str) -> (Option<&str>, &str) {
    match s.split_once(": ") {
        Some((sender, text)) => (Some(sender), text),
        None => (None, s),
    }
}

// ── Repeater login ─────────────────────────────────────────────────────

pub const MAX_PASSWORD_LEN: usize = 15;

/// Login request: `[timestamp(4 LE)][password]`, no terminator — the
/// repeater terminates the string on its side.
pub fn build_login(timestamp: u32, password: &str) -> Vec<u8> {
    let pwd = &password.as_bytes()[..password.len().min(MAX_PASSWORD_LEN)];
    let mut out = Vec::with_capacity(4 + pwd.len());
    out.extend_from_slice(&timestamp.to_le_bytes());
    out.extend_from_slice(pwd);
    out
}

pub const RESP_LOGIN_OK: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginResponse {
    pub ok: bool,
    pub is_admin: bool,
    pub permissions: u8,
}

/// Login response: `[timestamp(4)][resp_type(1)][keepalive(1)][is_admin(1)]
/// [permissions(1)]`.
pub fn parse_login_response(data: &[u8]) -> Option<LoginResponse> {
    if data.len() < 8 {
        return None;
    }
    Some(LoginResponse {
        ok: data[4] == RESP_LOGIN_OK,
        is_admin: data[6] != 0,
        permissions: data[7],
    })
}

// ── Advertisement app data ─────────────────────────────────────────────
// `[type | flags][lat(4 LE), lon(4 LE)]?[name]` — lat/lon in microdegrees,
// present when the location flag is set.

pub const ADVERT_FLAG_LOCATION: u8 = 0x10;

#[derive(Debug, Clone, PartialEq)]
pub struct AdvertData {
    pub node_type: NodeType,
    pub name: String,
    pub location: Option<(f64, f64)>,
}

pub fn build_advert(node_type: NodeType, name: &str, location: Option<(f64, f64)>) -> Vec<u8> {
    let mut out = Vec::with_capacity(9 + name.len());
    let mut head = node_type.to_wire();
    if location.is_some() {
        head |= ADVERT_FLAG_LOCATION;
    }
    out.push(head);
    if let Some((lat, lon)) = location {
        out.extend_from_slice(&((lat * 1e6) as i32).to_le_bytes());
        out.extend_from_slice(&((lon * 1e6) as i32).to_le_bytes());
    }
    out.extend_from_slice(name.as_bytes());
    out
}

pub fn parse_advert(data: &[u8]) -> Option<AdvertData> {
    let (&head, rest) = data.split_first()?;
    let node_type = NodeType::from_wire(head);
    let (location, name_bytes) = if head & ADVERT_FLAG_LOCATION != 0 {
        if rest.len() < 8 {
            return None;
        }
        let lat = i32::from_le_bytes([rest[0], rest[1], rest[2], rest[3]]) as f64 / 1e6;
        let lon = i32::from_le_bytes([rest[4], rest[5], rest[6], rest[7]]) as f64 / 1e6;
        (Some((lat, lon)), &rest[8..])
    } else {
        (None, rest)
    };
    Some(AdvertData {
        node_type,
        name: String::from_utf8_lossy(name_bytes).into_owned(),
        location,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_payload_layout() {
        let payload = build_text(0x1122_3344, TXT_TYPE_CLI_DATA, "status");
        assert_eq!(&payload[..4], &[0x44, 0x33, 0x22, 0x11]);
        assert_eq!(payload[4], 0x04); // CLI_DATA << 2
        assert_eq!(&payload[5..], b"status");

        let parsed = parse_text(&payload).unwrap();
        assert_eq!(parsed.timestamp, 0x1122_3344);
        assert_eq!(parsed.txt_type, TXT_TYPE_CLI_DATA);
        assert_eq!(parsed.attempt, 0);
        assert_eq!(parsed.text, "status");
    }

    #[test]
    fn short_text_payload_rejected() {
        assert!(parse_text(&[1, 2, 3, 4]).is_none());
        // Exactly a header is an empty message, not an error
        let parsed = parse_text(&[1, 2, 3, 4, 0]).unwrap();
        assert_eq!(parsed.text, "");
    }

    #[test]
    fn invalid_utf8_does_not_fault() {
        let mut payload = build_text(1, TXT_TYPE_PLAIN, "ok");
        payload.push(0xFF);
        assert!(parse_text(&payload).is_some());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_text("hello", 10), "hello");
        assert_eq!(truncate_text("hello", 3), "hel");
        // "é" is two bytes; cutting inside it backs off
        assert_eq!(truncate_text("aé", 2), "a");
    }

    #[test]
    fn ack_tag_inputs_all_matter() {
        let key = [7u8; 32];
        let tag = ack_tag(1000, 0, "hi", &key);
        assert_eq!(tag, ack_tag(1000, 0, "hi", &key));
        assert_ne!(tag, ack_tag(1001, 0, "hi", &key));
        assert_ne!(tag, ack_tag(1000, 1, "hi", &key));
        assert_ne!(tag, ack_tag(1000, 0, "ho", &key));
        assert_ne!(tag, ack_tag(1000, 0, "hi", &[8u8; 32]));
        // Only the low two attempt bits participate
        assert_eq!(tag, ack_tag(1000, 4, "hi", &key));
    }

    #[test]
    fn sender_text_convention() {
        assert_eq!(format_sender_text("Alice", "hello"), "Alice: hello");
        assert_eq!(split_sender_text("Alice: hello"), (Some("Alice"), "hello"));
        assert_eq!(split_sender_text("no separator"), (None, "no separator"));
        // First separator wins; the rest is message text
        assert_eq!(
            split_sender_text("Bob: see: this"),
            (Some("Bob"), "see: this")
        );
    }

    #[test]
    fn login_password_truncated() {
        let payload = build_login(5, "a-very-long-password-indeed");
        assert_eq!(payload.len(), 4 + MAX_PASSWORD_LEN);
        assert_eq!(&payload[4..], b"a-very-long-pas");
    }

    #[test]
    fn login_response_decoding() {
        let ok = [0, 0, 0, 0, RESP_LOGIN_OK, 1, 1, 3];
        let resp = parse_login_response(&ok).unwrap();
        assert!(resp.ok);
        assert!(resp.is_admin);
        assert_eq!(resp.permissions, 3);

        let denied = [0, 0, 0, 0, 2, 0, 0, 0];
        assert!(!parse_login_response(&denied).unwrap().ok);

        assert!(parse_login_response(&[0; 7]).is_none());
    }

    #[test]
    fn advert_with_location() {
        let data = build_advert(NodeType::Repeater, "hilltop", Some((46.52, 6.63)));
        let parsed = parse_advert(&data).unwrap();
        assert_eq!(parsed.node_type, NodeType::Repeater);
        assert_eq!(parsed.name, "hilltop");
        let (lat, lon) = parsed.location.unwrap();
        assert!((lat - 46.52).abs() < 1e-5);
        assert!((lon - 6.63).abs() < 1e-5);
    }

    #[test]
    fn advert_truncated_location_rejected() {
        let data = [NodeType::Chat.to_wire() | ADVERT_FLAG_LOCATION, 1, 2, 3];
        assert!(parse_advert(&data).is_none());
        assert!(parse_advert(&[]).is_none());
    }
}

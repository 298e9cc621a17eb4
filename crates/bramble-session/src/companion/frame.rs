use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::types::{ContactId, NodeType};

/// Upper bound on an encoded companion frame. The host link framing
/// enforces its own MTU; this bounds what the offline queue will hold.
pub const MAX_FRAME_LEN: usize = 512;

/// One inbound request from the companion app.
///
/// MessagePack-encoded; the byte framing around it belongs to the host
/// link, this core only defines the payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompanionRequest {
    SendChannelMessage { channel_idx: u8, text: String },
    SendDirectMessage { contact: ContactId, text: String },
    FetchContacts,
    FetchDeviceInfo,
    SetForwarding { enabled: bool },
    SendAdvert,
}

/// One outbound frame to the companion app.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CompanionFrame {
    /// One contact per frame — contact sync is spread across polls.
    Contact {
        id: ContactId,
        name: String,
        node_type: NodeType,
        last_heard: u32,
    },
    ContactSyncDone {
        count: u32,
    },
    DeviceInfo {
        node_id: ContactId,
        name: String,
        forwarding: bool,
    },
    ChannelMessage {
        channel_idx: u8,
        sender: String,
        text: String,
        timestamp: u32,
        hops: u8,
    },
    DirectMessage {
        contact: ContactId,
        sender: String,
        text: String,
        timestamp: u32,
    },
    SendResult {
        ok: bool,
        ack_tag: Option<u32>,
    },
    Error {
        message: String,
    },
}

pub fn decode_request(bytes: &[u8]) -> Result<CompanionRequest, SessionError> {
    rmp_serde::from_slice(bytes).map_err(Into::into)
}

pub fn encode_frame(frame: &CompanionFrame) -> Result<Vec<u8>, SessionError> {
    rmp_serde::to_vec(frame).map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_roundtrip() {
        let req = CompanionRequest::SendDirectMessage {
            contact: 0xAABB_CCDD,
            text: "on my way".into(),
        };
        let bytes = rmp_serde::to_vec(&req).unwrap();
        assert_eq!(decode_request(&bytes).unwrap(), req);
    }

    #[test]
    fn garbage_is_rejected_not_fatal() {
        assert!(decode_request(&[0xC1, 0xFF, 0x00]).is_err());
        assert!(decode_request(&[]).is_err());
    }

    #[test]
    fn encoded_notification_fits_queue_bound() {
        let frame = CompanionFrame::DirectMessage {
            contact: u32::MAX,
            sender: "B".repeat(32),
            text: "x".repeat(crate::types::MAX_DM_TEXT),
            timestamp: u32::MAX,
        };
        assert!(encode_frame(&frame).unwrap().len() <= MAX_FRAME_LEN);
    }
}

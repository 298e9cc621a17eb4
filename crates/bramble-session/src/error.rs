use crate::types::ContactId;

/// Session-level errors.
///
/// Everything here is recoverable — a failed operation returns control to
/// the scheduler loop with no state mutated.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("message text is empty")]
    EmptyMessage,

    #[error("no free pending-message slot")]
    NoFreeSlot,

    #[error("peer table full")]
    PeerTableFull,

    #[error("unknown contact: {0:08X}")]
    UnknownContact(ContactId),

    #[error("contact has no known public key")]
    MissingPublicKey,

    #[error("not connected to a repeater")]
    NotConnected,

    #[error("a repeater session is already active")]
    SessionBusy,

    #[error("companion frame decode error: {0}")]
    FrameDecode(String),

    #[error("companion frame encode error: {0}")]
    FrameEncode(String),
}

impl From<rmp_serde::decode::Error> for SessionError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        SessionError::FrameDecode(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for SessionError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        SessionError::FrameEncode(e.to_string())
    }
}

//! Bramble session layer.
//!
//! The application-level mesh-session engine of a handheld LoRa messenger:
//! acknowledged direct messaging with retry and path learning, channel
//! repeat tracking, a repeater administration session, and a bounded
//! store-and-forward bridge to a companion app — on top of an external
//! mesh transport that provides identity, encryption and flood
//! dissemination.
//!
//! Everything runs on one cooperative foreground loop: the transport
//! drives the dispatch hooks in [`SessionState`], the host polls
//! [`SessionState::tick`] and executes the returned effects. No async, no
//! locks; fixed-capacity tables provide the backpressure.
//!
//! Wire format: MessagePack for companion frames; fixed byte layouts
//! shared with the transport for radio payloads.

pub mod companion;
pub mod config;
pub mod delivery;
pub mod directory;
pub mod error;
pub mod identity;
pub mod path;
pub mod repeat;
pub mod repeater;
pub mod session;
pub mod types;
pub mod wire;

pub use companion::{CompanionBridge, CompanionFrame, CompanionRequest};
pub use config::SessionConfig;
pub use delivery::{DeliveryAction, DeliveryManager, DeliveryReport};
pub use directory::{Message, MessageHistory, NodeDirectory, NodeInfo};
pub use error::SessionError;
pub use identity::{IdentityOps, PeerIdentity};
pub use path::{is_path_valid, DmPeer, PeerTable};
pub use repeat::{hash_channel_message, RepeatTracker};
pub use repeater::{RepeaterSession, RepeaterState};
pub use session::{
    Outbound, PacketMeta, Route, RouteKind, SessionEffect, SessionEvent, SessionState,
};
pub use types::{ContactId, NodeType, PubKey, SharedSecret};

//! Wire protocol for paircall signaling
//!
//! Defines the JSON messages exchanged between clients and the signaling
//! broker. Every message is one WebSocket text frame carrying an
//! adjacently-tagged envelope: `{"event": <name>, "data": <params>}`.
//!
//! The broker treats relayed negotiation payloads as opaque
//! [`serde_json::Value`]s; the typed view of those payloads
//! ([`SignalPayload`]) exists for clients and is defined in [`payload`].

pub mod error;
pub mod messages;
pub mod payload;

pub use error::{Error, Result};
pub use messages::{
    ClientRequest, ConnectedParams, ErrorParams, ExistingParticipantsParams, JoinRoomParams,
    RoomCreatedParams, ServerEvent, SignalDelivery, SignalEnvelope, UserJoinedParams,
    UserLeftParams,
};
pub use payload::{IceCandidate, SessionDescription, SignalPayload};

//! Signaling message types
//!
//! Inbound requests ([`ClientRequest`]) and outbound events
//! ([`ServerEvent`]) as seen on the wire. Event names and field casing
//! follow the browser clients: kebab-case event names, camelCase fields.

use serde::{Deserialize, Serialize};

/// Requests a client sends to the broker
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientRequest {
    /// Allocate a new room with the caller as sole participant
    CreateRoom,

    /// Join an existing room by token
    JoinRoom(JoinRoomParams),

    /// Relay an opaque negotiation payload to another participant
    Signal(SignalEnvelope),
}

/// Parameters for join-room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomParams {
    /// Token of the room to join
    pub room_id: String,
}

/// A directed relay message
///
/// `to` is normally the destination connection identity; a room token is
/// accepted as a fallback for the very first offer, before the sender has
/// learned its peer's identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalEnvelope {
    /// Destination connection identity (or room token, see above)
    pub to: String,

    /// Sender connection identity
    pub from: String,

    /// Opaque negotiation payload, forwarded unmodified
    pub signal: serde_json::Value,
}

/// Events the broker sends to a client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// First event on every connection: the identity the broker assigned
    ///
    /// Clients quote this identity as `from` in the signals they send.
    Connected(ConnectedParams),

    /// Room allocated; sent to the creator only
    RoomCreated(RoomCreatedParams),

    /// Another participant joined the recipient's room
    UserJoined(UserJoinedParams),

    /// Participants already present, sent to a joiner on entry
    ExistingParticipants(ExistingParticipantsParams),

    /// A relayed negotiation payload
    Signal(SignalDelivery),

    /// A participant left the recipient's room
    UserLeft(UserLeftParams),

    /// A request failed; sent to the requester only
    Error(ErrorParams),
}

/// Parameters for connected
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedParams {
    /// The identity assigned to this connection
    pub user_id: String,
}

/// Parameters for room-created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreatedParams {
    /// Token of the newly created room
    pub room_id: String,
}

/// Parameters for user-joined
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserJoinedParams {
    /// Connection identity of the participant that joined
    pub user_id: String,
}

/// Parameters for existing-participants
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExistingParticipantsParams {
    /// Connection identities already in the room, in join order
    pub participants: Vec<String>,
}

/// A relayed payload as delivered to its destination
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalDelivery {
    /// Opaque negotiation payload, exactly as sent
    pub signal: serde_json::Value,

    /// Connection identity of the sender
    pub from: String,
}

/// Parameters for user-left
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserLeftParams {
    /// Connection identity of the participant that left
    pub user_id: String,
}

/// Parameters for error
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorParams {
    /// Human-readable failure description
    pub message: String,
}

impl ClientRequest {
    /// Encode to a JSON text frame
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON text frame
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl ServerEvent {
    /// Encode to a JSON text frame
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from a JSON text frame
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Shorthand for an error event
    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error(ErrorParams {
            message: message.into(),
        })
    }
}

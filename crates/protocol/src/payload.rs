//! Typed view of the relayed negotiation payload
//!
//! The broker never deserializes these; they define the payload contract
//! between the two clients of a room. The outer shape is tagged by `type`
//! (`offer`, `answer`, `candidate`), matching what browser peers put on
//! the wire.

use serde::{Deserialize, Serialize};

/// A negotiation payload carried inside a signal message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalPayload {
    /// Session offer from the originating side
    Offer {
        /// Offer description produced by the transport object
        sdp: SessionDescription,
    },

    /// Session answer from the responding side
    Answer {
        /// Answer description produced by the transport object
        sdp: SessionDescription,
    },

    /// Connectivity candidate discovered during establishment
    Candidate {
        /// The candidate descriptor
        candidate: IceCandidate,
    },
}

/// Capability-negotiation description (offer or answer)
///
/// Opaque to everything except the transport object that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDescription {
    /// Description kind: "offer" or "answer"
    #[serde(rename = "type")]
    pub kind: String,

    /// The description body
    pub sdp: String,
}

impl SessionDescription {
    /// Build an offer description
    pub fn offer(sdp: impl Into<String>) -> Self {
        Self {
            kind: "offer".to_string(),
            sdp: sdp.into(),
        }
    }

    /// Build an answer description
    pub fn answer(sdp: impl Into<String>) -> Self {
        Self {
            kind: "answer".to_string(),
            sdp: sdp.into(),
        }
    }
}

/// Opaque network-path descriptor produced during establishment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IceCandidate {
    /// Candidate string
    pub candidate: String,

    /// Media line identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_mid: Option<String>,

    /// Media line index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdp_m_line_index: Option<u16>,
}

impl SignalPayload {
    /// Encode into the opaque value carried by a signal envelope
    pub fn to_value(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Decode from the opaque value of a received signal
    pub fn from_value(value: &serde_json::Value) -> crate::Result<Self> {
        Ok(serde_json::from_value(value.clone())?)
    }
}

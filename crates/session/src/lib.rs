//! Client-side call session for paircall
//!
//! Drives one two-party call: talks to the signaling broker, walks the
//! negotiation state machine, and delegates media capture and the actual
//! peer-to-peer transport to externally supplied capabilities behind the
//! [`MediaSource`] and [`RtcTransport`] traits.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │  UI surface                                   │
//! │  ↓ create_room / join_room / end_call         │
//! │  CallSession (state machine)                  │
//! │  ├─ SignalingClient (WebSocket to broker)     │
//! │  ├─ MediaSource (external capture capability) │
//! │  └─ RtcTransport (external transport object,  │
//! │     at most one per session)                  │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! The session consumes broker events and transport events, and produces
//! broker requests plus [`SessionEvent`] notifications for the UI.

pub mod call;
pub mod config;
pub mod error;
pub mod media;
pub mod signaling;
pub mod transport;

pub use call::{drive_session, CallSession, CallState, SessionEvent};
pub use config::{AudioConstraints, MediaConstraints, SessionConfig, VideoConstraints};
pub use error::{Error, Result};
pub use media::{MediaSource, MediaStream, MediaTrack, TrackKind};
pub use signaling::SignalingClient;
pub use transport::{RemoteTrack, RtcTransport, TransportEvent, TransportFactory};

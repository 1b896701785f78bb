//! Signaling broker for paircall two-party video sessions
//!
//! The broker accepts persistent WebSocket connections, assigns each one an
//! opaque connection identity, and exposes four operations: create room,
//! join room, relay signal, disconnect. Rooms hold at most two participants
//! and are deleted the instant they empty. Relayed payloads are never
//! inspected; the broker is a blind relay keyed by participant identity and
//! room identity.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Clients (one WebSocket each)                │
//! │  ↓                                           │
//! │  SignalingServer (accept loop)               │
//! │  └─ per-connection task                      │
//! │      ├─ writer task (outbound event queue)   │
//! │      └─ read loop → Broker::dispatch         │
//! │           ↓                                  │
//! │  Broker (room table + connection registry,   │
//! │          one lock, one critical section      │
//! │          per request)                        │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! Known limitation: a room stuck with a single participant is never
//! reaped; it lives until that participant disconnects.

pub mod broker;
pub mod config;
pub mod error;

mod connection;
mod server;

pub use broker::Broker;
pub use config::BrokerConfig;
pub use error::{Error, Result};
pub use server::{ServerHandle, SignalingServer};

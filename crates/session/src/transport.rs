//! External real-time transport contract
//!
//! The negotiation/transport object (an RTCPeerConnection in a browser
//! host, webrtc-rs in a native one) is supplied from outside. The session
//! owns at most one at a time and drives it exclusively through this
//! trait; candidate discovery and remote-track arrival flow back through
//! a [`TransportEvent`] channel handed to the factory at creation.

use crate::config::SessionConfig;
use crate::media::{MediaStream, TrackKind};
use crate::Result;
use async_trait::async_trait;
use paircall_protocol::{IceCandidate, SessionDescription};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Events emitted by the transport object
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// A local connectivity candidate was discovered
    LocalCandidate(IceCandidate),

    /// A remote media track arrived
    RemoteMedia(RemoteTrack),
}

/// Descriptor of a remote track surfaced to the UI
#[derive(Debug, Clone)]
pub struct RemoteTrack {
    /// Track identifier assigned by the transport
    pub id: String,

    /// Track kind
    pub kind: TrackKind,
}

/// The negotiation/transport object for one call
#[async_trait]
pub trait RtcTransport: Send + Sync {
    /// Produce a session offer
    async fn create_offer(&self) -> Result<SessionDescription>;

    /// Produce a session answer for the current remote offer
    async fn create_answer(&self) -> Result<SessionDescription>;

    /// Install a locally produced description
    async fn set_local_description(&self, desc: SessionDescription) -> Result<()>;

    /// Install the remote side's description
    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()>;

    /// Feed a remote connectivity candidate
    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()>;

    /// Tear the transport down; must be idempotent
    async fn close(&self) -> Result<()>;
}

/// Creates transport objects wired to a session
#[async_trait]
pub trait TransportFactory: Send + Sync {
    /// Create a transport carrying `local_stream`'s tracks
    ///
    /// `events` receives every [`TransportEvent`] for the transport's
    /// lifetime; dropping the receiver just discards further events.
    async fn create(
        &self,
        config: &SessionConfig,
        local_stream: &dyn MediaStream,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn RtcTransport>>;
}

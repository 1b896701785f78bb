//! Call session state machine
//!
//! One [`CallSession`] per call. It consumes broker events and transport
//! events, produces broker requests, and owns at most one transport object
//! at a time. Handlers never tear the session down on a bad inbound
//! message; stale or unrecognized signals are logged and dropped.

use crate::config::SessionConfig;
use crate::media::{MediaSource, MediaStream};
use crate::transport::{RemoteTrack, RtcTransport, TransportEvent, TransportFactory};
use crate::{Error, Result};
use paircall_protocol::{
    ClientRequest, JoinRoomParams, ServerEvent, SignalDelivery, SignalEnvelope, SignalPayload,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where a call session is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    /// No call; ready to create or join a room
    Idle,
    /// Waiting for the broker to allocate our room
    Creating,
    /// Waiting for the broker to admit us to a room
    Joining,
    /// In a room, exchanging descriptions and candidates
    Negotiating,
    /// Remote media is flowing
    Connected,
    /// Call torn down; ready to create or join again
    Ended,
}

/// Notifications surfaced to whatever hosts the session (a call UI)
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session moved to a new state
    StateChanged(CallState),

    /// A remote media track arrived
    RemoteMedia(RemoteTrack),

    /// A room-entry attempt or request failed; `message` is user-facing
    Failed {
        /// User-facing failure description
        message: String,
    },
}

/// Client-side state machine for one two-party call
pub struct CallSession {
    config: SessionConfig,
    media_source: Arc<dyn MediaSource>,
    transport_factory: Arc<dyn TransportFactory>,

    /// Outbound requests toward the signaling connection
    requests: mpsc::UnboundedSender<ClientRequest>,

    /// Sender handed to the transport factory for candidate/track events
    transport_events: mpsc::UnboundedSender<TransportEvent>,

    /// Notifications toward the UI surface
    notifications: mpsc::UnboundedSender<SessionEvent>,

    state: CallState,

    /// Our broker-assigned connection identity, from the welcome event
    local_id: Option<String>,

    /// Token of the room we created or joined
    room_id: Option<String>,

    /// The peer's connection identity, once learned
    peer_id: Option<String>,

    /// Whether we created the room (and so wait for a peer to offer to)
    initiator: bool,

    /// The one live transport object, if negotiation has started
    transport: Option<Arc<dyn RtcTransport>>,

    /// Local capture stream held for the duration of the call
    local_stream: Option<Box<dyn MediaStream>>,
}

impl CallSession {
    /// Create a session
    ///
    /// `requests` feeds the signaling connection; `transport_events` is
    /// the sender half of the channel whose receiver the caller pumps
    /// into [`CallSession::handle_transport_event`]. Returns the session
    /// and the receiver for UI notifications.
    pub fn new(
        config: SessionConfig,
        media_source: Arc<dyn MediaSource>,
        transport_factory: Arc<dyn TransportFactory>,
        requests: mpsc::UnboundedSender<ClientRequest>,
        transport_events: mpsc::UnboundedSender<TransportEvent>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (notifications, notifications_rx) = mpsc::unbounded_channel();
        let session = Self {
            config,
            media_source,
            transport_factory,
            requests,
            transport_events,
            notifications,
            state: CallState::Idle,
            local_id: None,
            room_id: None,
            peer_id: None,
            initiator: false,
            transport: None,
            local_stream: None,
        };
        (session, notifications_rx)
    }

    /// Current state
    pub fn state(&self) -> CallState {
        self.state
    }

    /// Token of the current room, if any
    pub fn room_id(&self) -> Option<&str> {
        self.room_id.as_deref()
    }

    /// Our broker-assigned identity, once the welcome event arrived
    pub fn local_id(&self) -> Option<&str> {
        self.local_id.as_deref()
    }

    /// The peer's connection identity, once learned
    pub fn peer_id(&self) -> Option<&str> {
        self.peer_id.as_deref()
    }

    /// Whether a call is being set up or running
    pub fn is_call_active(&self) -> bool {
        matches!(
            self.state,
            CallState::Creating | CallState::Joining | CallState::Negotiating | CallState::Connected
        )
    }

    /// Acquire local media and ask the broker for a new room
    ///
    /// # Errors
    ///
    /// Media failures abort the attempt before anything is sent; use
    /// [`Error::user_message`] for display. [`Error::CallInProgress`] if
    /// a call is already active on this session.
    pub async fn create_room(&mut self) -> Result<()> {
        self.ensure_idle()?;
        let stream = self.media_source.acquire(&self.config.media).await?;
        self.local_stream = Some(stream);
        self.initiator = true;
        self.send_request(ClientRequest::CreateRoom)?;
        self.set_state(CallState::Creating);
        Ok(())
    }

    /// Acquire local media and ask the broker to join `room_id`
    ///
    /// # Errors
    ///
    /// As [`CallSession::create_room`]. A rejection by the broker
    /// (unknown or full room) arrives later as an `error` event and is
    /// surfaced through [`SessionEvent::Failed`].
    pub async fn join_room(&mut self, room_id: &str) -> Result<()> {
        self.ensure_idle()?;
        let stream = self.media_source.acquire(&self.config.media).await?;
        self.local_stream = Some(stream);
        self.initiator = false;
        self.room_id = Some(room_id.to_string());
        self.send_request(ClientRequest::JoinRoom(JoinRoomParams {
            room_id: room_id.to_string(),
        }))?;
        self.set_state(CallState::Joining);
        Ok(())
    }

    /// Tear down the call: close the transport, stop local tracks
    ///
    /// Idempotent; a second call is a no-op.
    pub async fn end_call(&mut self) {
        let nothing_held = self.transport.is_none() && self.local_stream.is_none();
        if nothing_held && matches!(self.state, CallState::Idle | CallState::Ended) {
            return;
        }

        if let Some(transport) = self.transport.take() {
            if let Err(err) = transport.close().await {
                warn!(error = %err, "error closing transport");
            }
        }
        if let Some(stream) = self.local_stream.take() {
            stream.stop_all();
        }
        self.room_id = None;
        self.peer_id = None;
        self.initiator = false;
        info!("call ended");
        self.set_state(CallState::Ended);
    }

    /// Feed one broker event into the state machine
    pub async fn handle_server_event(&mut self, event: ServerEvent) -> Result<()> {
        match event {
            ServerEvent::Connected(params) => {
                debug!(user_id = %params.user_id, "assigned connection identity");
                self.local_id = Some(params.user_id);
            }
            ServerEvent::RoomCreated(params) => {
                info!(room_id = %params.room_id, "room created");
                self.room_id = Some(params.room_id);
                self.initiator = true;
                // The transport is created up front so candidate gathering
                // can start; the offer waits for a peer.
                self.ensure_transport().await?;
                self.set_state(CallState::Negotiating);
            }
            ServerEvent::UserJoined(params) => {
                info!(user_id = %params.user_id, "peer joined the room");
                self.peer_id = Some(params.user_id);
                if self.initiator {
                    self.send_offer().await?;
                }
            }
            ServerEvent::ExistingParticipants(params) => {
                match params.participants.first() {
                    Some(peer) => {
                        info!(peer_id = %peer, "joined room with existing participant");
                        self.peer_id = Some(peer.clone());
                        self.set_state(CallState::Negotiating);
                        self.send_offer().await?;
                    }
                    None => debug!("joined an empty room; waiting"),
                }
            }
            ServerEvent::Signal(delivery) => {
                self.handle_signal(delivery).await?;
            }
            ServerEvent::UserLeft(params) => {
                info!(user_id = %params.user_id, "peer left the room");
                self.peer_id = None;
            }
            ServerEvent::Error(params) => {
                warn!(message = %params.message, "broker reported an error");
                if matches!(self.state, CallState::Creating | CallState::Joining) {
                    self.abort_entry(&params.message).await;
                } else {
                    self.notify(SessionEvent::Failed {
                        message: params.message,
                    });
                }
            }
        }
        Ok(())
    }

    /// Feed one transport event into the state machine
    pub async fn handle_transport_event(&mut self, event: TransportEvent) -> Result<()> {
        match event {
            TransportEvent::LocalCandidate(candidate) => match self.signal_target() {
                Some(target) => {
                    self.send_signal(target, SignalPayload::Candidate { candidate })?;
                }
                None => debug!("discarding candidate discovered outside a room"),
            },
            TransportEvent::RemoteMedia(track) => {
                info!(track_id = %track.id, kind = ?track.kind, "remote track arrived");
                self.set_state(CallState::Connected);
                self.notify(SessionEvent::RemoteMedia(track));
            }
        }
        Ok(())
    }

    async fn handle_signal(&mut self, delivery: SignalDelivery) -> Result<()> {
        let payload = match SignalPayload::from_value(&delivery.signal) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(from = %delivery.from, error = %err, "ignoring unrecognized signal payload");
                return Ok(());
            }
        };

        match payload {
            SignalPayload::Offer { sdp } => {
                self.peer_id = Some(delivery.from.clone());
                let transport = self.ensure_transport().await?;
                transport.set_remote_description(sdp).await?;
                let answer = transport.create_answer().await?;
                transport.set_local_description(answer.clone()).await?;
                if matches!(self.state, CallState::Creating | CallState::Joining) {
                    self.set_state(CallState::Negotiating);
                }
                self.send_signal(delivery.from, SignalPayload::Answer { sdp: answer })?;
            }
            SignalPayload::Answer { sdp } => match &self.transport {
                Some(transport) => {
                    transport.set_remote_description(sdp).await?;
                }
                None => {
                    // Stale or duplicate: the session that produced the
                    // matching offer is gone.
                    warn!(from = %delivery.from, "ignoring answer with no active transport");
                }
            },
            SignalPayload::Candidate { candidate } => match &self.transport {
                Some(transport) => {
                    transport.add_ice_candidate(candidate).await?;
                }
                None => debug!(from = %delivery.from, "ignoring candidate with no active transport"),
            },
        }
        Ok(())
    }

    async fn send_offer(&mut self) -> Result<()> {
        let transport = self.ensure_transport().await?;
        let offer = transport.create_offer().await?;
        transport.set_local_description(offer.clone()).await?;
        let target = self
            .signal_target()
            .ok_or_else(|| Error::Signaling("no destination for offer".to_string()))?;
        info!(%target, "sending offer");
        self.send_signal(target, SignalPayload::Offer { sdp: offer })
    }

    async fn ensure_transport(&mut self) -> Result<Arc<dyn RtcTransport>> {
        if let Some(transport) = &self.transport {
            return Ok(Arc::clone(transport));
        }
        let stream = self
            .local_stream
            .as_deref()
            .ok_or_else(|| Error::Transport("no local media acquired".to_string()))?;
        let transport = self
            .transport_factory
            .create(&self.config, stream, self.transport_events.clone())
            .await?;
        self.transport = Some(Arc::clone(&transport));
        Ok(transport)
    }

    /// Destination for outbound signals: the peer once known, the room
    /// token as the first-offer fallback
    fn signal_target(&self) -> Option<String> {
        self.peer_id.clone().or_else(|| self.room_id.clone())
    }

    fn send_signal(&self, to: String, payload: SignalPayload) -> Result<()> {
        let from = self
            .local_id
            .clone()
            .ok_or_else(|| Error::Signaling("connection identity not yet assigned".to_string()))?;
        let signal = payload.to_value()?;
        self.send_request(ClientRequest::Signal(SignalEnvelope { to, from, signal }))
    }

    fn send_request(&self, request: ClientRequest) -> Result<()> {
        self.requests
            .send(request)
            .map_err(|_| Error::Signaling("signaling connection closed".to_string()))
    }

    async fn abort_entry(&mut self, message: &str) {
        if let Some(transport) = self.transport.take() {
            if let Err(err) = transport.close().await {
                warn!(error = %err, "error closing transport");
            }
        }
        if let Some(stream) = self.local_stream.take() {
            stream.stop_all();
        }
        self.room_id = None;
        self.peer_id = None;
        self.initiator = false;
        self.set_state(CallState::Idle);
        self.notify(SessionEvent::Failed {
            message: message.to_string(),
        });
    }

    fn ensure_idle(&self) -> Result<()> {
        if matches!(self.state, CallState::Idle | CallState::Ended) {
            Ok(())
        } else {
            Err(Error::CallInProgress)
        }
    }

    fn set_state(&mut self, state: CallState) {
        if self.state != state {
            debug!(from = ?self.state, to = ?state, "state transition");
            self.state = state;
            self.notify(SessionEvent::StateChanged(state));
        }
    }

    fn notify(&self, event: SessionEvent) {
        // The UI may have gone away; the session does not care.
        let _ = self.notifications.send(event);
    }
}

/// Pump broker and transport events into a session until the signaling
/// connection closes
///
/// Handler errors are logged and the loop keeps going; a single bad
/// message must not end the call.
pub async fn drive_session(
    session: &mut CallSession,
    mut server_events: mpsc::UnboundedReceiver<ServerEvent>,
    mut transport_events: mpsc::UnboundedReceiver<TransportEvent>,
) {
    loop {
        tokio::select! {
            event = server_events.recv() => match event {
                Some(event) => {
                    if let Err(err) = session.handle_server_event(event).await {
                        warn!(error = %err, "failed to handle broker event");
                    }
                }
                None => {
                    info!("signaling connection closed");
                    session.end_call().await;
                    break;
                }
            },
            event = transport_events.recv() => match event {
                Some(event) => {
                    if let Err(err) = session.handle_transport_event(event).await {
                        warn!(error = %err, "failed to handle transport event");
                    }
                }
                None => break,
            },
        }
    }
}

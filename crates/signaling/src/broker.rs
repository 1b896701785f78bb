//! Room table and relay core
//!
//! [`Broker`] owns the process-wide signaling state: the room table and the
//! connection registry, guarded by a single lock so that every request is
//! one atomic step relative to every other request. A join racing a
//! disconnect can never both observe the same participant count, and a
//! room is deleted in the same critical section that emptied it.
//!
//! Outbound events go through per-connection unbounded senders; no broker
//! operation waits on a peer.

use crate::{Error, Result};
use paircall_protocol::{
    ClientRequest, ConnectedParams, ExistingParticipantsParams, RoomCreatedParams, ServerEvent,
    SignalDelivery, SignalEnvelope, UserJoinedParams, UserLeftParams,
};
use std::collections::HashMap;
use tokio::sync::mpsc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Maximum participants per room
pub const ROOM_CAPACITY: usize = 2;

/// A two-party room
///
/// Participants are stored in join order; the first entry is the creator
/// for as long as it stays connected.
#[derive(Debug, Clone, Default)]
struct Room {
    participants: Vec<String>,
}

/// A live client connection as the broker sees it
struct Connection {
    /// Outbound event queue draining into the connection's writer task
    sender: mpsc::UnboundedSender<ServerEvent>,

    /// Token of the room this connection belongs to, if any
    room_id: Option<String>,
}

#[derive(Default)]
struct BrokerState {
    rooms: HashMap<String, Room>,
    connections: HashMap<String, Connection>,
}

/// The signaling broker
///
/// All state lives behind one lock; each public operation takes the lock
/// once and completes without awaiting anything else.
pub struct Broker {
    state: RwLock<BrokerState>,
}

impl Default for Broker {
    fn default() -> Self {
        Self::new()
    }
}

impl Broker {
    /// Create an empty broker
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BrokerState::default()),
        }
    }

    /// Register a new connection and assign it an identity
    ///
    /// `sender` receives every event addressed to this connection until
    /// [`Broker::disconnect`] is called for the returned identity. The
    /// first queued event is `connected` carrying the assigned identity,
    /// which clients quote as `from` when signaling.
    pub async fn register(&self, sender: mpsc::UnboundedSender<ServerEvent>) -> String {
        let conn_id = Uuid::new_v4().to_string();
        let mut state = self.state.write().await;
        state.connections.insert(
            conn_id.clone(),
            Connection {
                sender,
                room_id: None,
            },
        );
        Self::send(
            &state,
            &conn_id,
            ServerEvent::Connected(ConnectedParams {
                user_id: conn_id.clone(),
            }),
        );
        conn_id
    }

    /// Single dispatch point for inbound client requests
    ///
    /// Request failures are reported to the requester only; they never
    /// mutate shared state or affect other rooms.
    pub async fn dispatch(&self, conn_id: &str, request: ClientRequest) {
        let result = match request {
            ClientRequest::CreateRoom => {
                self.create_room(conn_id).await;
                Ok(())
            }
            ClientRequest::JoinRoom(params) => self.join_room(conn_id, &params.room_id).await,
            ClientRequest::Signal(envelope) => {
                self.relay_signal(envelope).await;
                Ok(())
            }
        };

        if let Err(err) = result {
            match err.user_message() {
                Some(message) => self.notify(conn_id, ServerEvent::error(message)).await,
                None => warn!(%conn_id, error = %err, "request failed"),
            }
        }
    }

    /// Allocate a new room with `conn_id` as sole participant
    ///
    /// The caller receives `room-created` with the new token. There is no
    /// error case; token generation retries until an unused token comes up
    /// (with v4 identifiers the loop body effectively never repeats).
    pub async fn create_room(&self, conn_id: &str) {
        let mut state = self.state.write().await;
        if !state.connections.contains_key(conn_id) {
            debug!(%conn_id, "create-room from unknown connection");
            return;
        }

        let room_id = loop {
            let candidate = Uuid::new_v4().to_string();
            if !state.rooms.contains_key(&candidate) {
                break candidate;
            }
        };

        state.rooms.insert(
            room_id.clone(),
            Room {
                participants: vec![conn_id.to_string()],
            },
        );
        if let Some(conn) = state.connections.get_mut(conn_id) {
            conn.room_id = Some(room_id.clone());
        }

        info!(%room_id, %conn_id, "room created");
        Self::send(&state, conn_id, ServerEvent::RoomCreated(RoomCreatedParams { room_id }));
    }

    /// Join `conn_id` to an existing room
    ///
    /// On success the existing participant is told `user-joined` and the
    /// caller is told `existing-participants`.
    ///
    /// # Errors
    ///
    /// [`Error::RoomNotFound`] if no such room, [`Error::RoomFull`] if the
    /// room already holds two participants. Neither mutates any state.
    pub async fn join_room(&self, conn_id: &str, room_id: &str) -> Result<()> {
        let mut state = self.state.write().await;

        let room = state
            .rooms
            .get(room_id)
            .ok_or_else(|| Error::RoomNotFound(room_id.to_string()))?;
        if room.participants.len() >= ROOM_CAPACITY {
            return Err(Error::RoomFull(room_id.to_string()));
        }

        let others: Vec<String> = room.participants.clone();
        if let Some(room) = state.rooms.get_mut(room_id) {
            room.participants.push(conn_id.to_string());
        }
        if let Some(conn) = state.connections.get_mut(conn_id) {
            conn.room_id = Some(room_id.to_string());
        }

        for other in &others {
            Self::send(
                &state,
                other,
                ServerEvent::UserJoined(UserJoinedParams {
                    user_id: conn_id.to_string(),
                }),
            );
        }
        Self::send(
            &state,
            conn_id,
            ServerEvent::ExistingParticipants(ExistingParticipantsParams {
                participants: others,
            }),
        );

        info!(%room_id, %conn_id, "participant joined");
        Ok(())
    }

    /// Relay an opaque payload to its destination, best effort
    ///
    /// `to` is resolved first as a connection identity, then as a room
    /// token (delivering to every participant except the sender, the
    /// fallback clients use for their very first offer). An unknown
    /// destination drops the message silently: no error to the sender, no
    /// retry, no queueing.
    pub async fn relay_signal(&self, envelope: SignalEnvelope) {
        let state = self.state.read().await;
        let SignalEnvelope { to, from, signal } = envelope;

        if state.connections.contains_key(&to) {
            Self::send(&state, &to, ServerEvent::Signal(SignalDelivery { signal, from }));
            return;
        }

        if let Some(room) = state.rooms.get(&to) {
            let event = ServerEvent::Signal(SignalDelivery { signal, from: from.clone() });
            for participant in room.participants.iter().filter(|p| **p != from) {
                Self::send(&state, participant, event.clone());
            }
            return;
        }

        debug!(%to, %from, "dropping signal for unknown destination");
    }

    /// Remove a connection after transport-level loss
    ///
    /// Uses the room token stored on the connection, so teardown is O(1)
    /// in the size of the room table. The remaining participant receives
    /// `user-left`; a room that empties is deleted in the same step.
    pub async fn disconnect(&self, conn_id: &str) {
        let mut state = self.state.write().await;

        let Some(conn) = state.connections.remove(conn_id) else {
            return;
        };
        let Some(room_id) = conn.room_id else {
            return;
        };

        let remaining = match state.rooms.get_mut(&room_id) {
            Some(room) => {
                room.participants.retain(|p| p != conn_id);
                room.participants.clone()
            }
            None => return,
        };

        for participant in &remaining {
            Self::send(
                &state,
                participant,
                ServerEvent::UserLeft(UserLeftParams {
                    user_id: conn_id.to_string(),
                }),
            );
        }

        if remaining.is_empty() {
            state.rooms.remove(&room_id);
            info!(%room_id, "room deleted (no participants)");
        }
    }

    /// Send an event to a single connection, best effort
    pub(crate) async fn notify(&self, conn_id: &str, event: ServerEvent) {
        let state = self.state.read().await;
        Self::send(&state, conn_id, event);
    }

    fn send(state: &BrokerState, conn_id: &str, event: ServerEvent) {
        if let Some(conn) = state.connections.get(conn_id) {
            // A send error means the writer task is gone and the
            // connection is about to be torn down; the event is moot.
            let _ = conn.sender.send(event);
        }
    }

    /// Number of live rooms
    pub async fn room_count(&self) -> usize {
        self.state.read().await.rooms.len()
    }

    /// Check if a room exists
    pub async fn has_room(&self, room_id: &str) -> bool {
        self.state.read().await.rooms.contains_key(room_id)
    }

    /// Participant count of a room, if it exists
    pub async fn participant_count(&self, room_id: &str) -> Option<usize> {
        self.state
            .read()
            .await
            .rooms
            .get(room_id)
            .map(|room| room.participants.len())
    }

    /// Number of registered connections
    pub async fn connection_count(&self) -> usize {
        self.state.read().await.connections.len()
    }
}

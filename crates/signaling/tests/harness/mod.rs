//! Signaling end-to-end test harness
//!
//! Provides infrastructure for integration testing the broker over real
//! WebSockets:
//! - Embedded signaling server on a random port
//! - [`TestPeer`], a thin WebSocket client speaking the wire protocol
//!
//! Basic usage pattern:
//!
//! 1. `start_server()` to get a running server + bound address
//! 2. `TestPeer::connect()` one peer per simulated client
//! 3. Drive requests and assert on received events
//! 4. `handle.shutdown()` to clean up

use futures::{SinkExt, StreamExt};
use paircall_protocol::{ClientRequest, JoinRoomParams, ServerEvent, SignalEnvelope};
use paircall_signaling::{BrokerConfig, ServerHandle, SignalingServer};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// How long to wait for an expected event before failing the test
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to watch for events that must NOT arrive
pub const QUIET_PERIOD: Duration = Duration::from_millis(200);

/// Start a signaling server on an ephemeral port, returning its handle
pub async fn start_server() -> ServerHandle {
    let config = BrokerConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
    };
    let server = SignalingServer::new(config);
    server.start().await.expect("failed to start server")
}

/// A WebSocket client speaking the signaling wire protocol
pub struct TestPeer {
    /// Identity assigned by the broker on connect
    pub id: String,

    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestPeer {
    /// Connect and consume the `connected` welcome event
    pub async fn connect(addr: SocketAddr) -> Self {
        let url = format!("ws://{}", addr);
        let (socket, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("failed to connect");
        let mut peer = Self {
            id: String::new(),
            socket,
        };
        match peer.next_event().await {
            ServerEvent::Connected(params) => peer.id = params.user_id,
            other => panic!("expected connected, got {:?}", other),
        }
        peer
    }

    /// Send a request frame
    pub async fn send(&mut self, request: ClientRequest) {
        let frame = request.to_json().expect("failed to encode request");
        self.socket
            .send(Message::Text(frame))
            .await
            .expect("failed to send");
    }

    /// Send a raw text frame (for malformed-input tests)
    pub async fn send_raw(&mut self, frame: &str) {
        self.socket
            .send(Message::Text(frame.to_string()))
            .await
            .expect("failed to send");
    }

    /// Wait for the next event, failing the test on timeout
    pub async fn next_event(&mut self) -> ServerEvent {
        loop {
            let message = tokio::time::timeout(EVENT_TIMEOUT, self.socket.next())
                .await
                .expect("timed out waiting for event")
                .expect("connection closed while waiting for event")
                .expect("websocket error");
            match message {
                Message::Text(text) => {
                    return ServerEvent::from_json(&text).expect("failed to decode event")
                }
                // Control frames are irrelevant to the protocol under test.
                _ => continue,
            }
        }
    }

    /// Assert that no event arrives within the quiet period
    pub async fn expect_silence(&mut self) {
        let result = tokio::time::timeout(QUIET_PERIOD, self.socket.next()).await;
        if let Ok(Some(Ok(Message::Text(text)))) = result {
            panic!("expected no event, got {}", text);
        }
    }

    /// Create a room and return its token
    pub async fn create_room(&mut self) -> String {
        self.send(ClientRequest::CreateRoom).await;
        match self.next_event().await {
            ServerEvent::RoomCreated(params) => params.room_id,
            other => panic!("expected room-created, got {:?}", other),
        }
    }

    /// Ask to join a room (the resulting event is the caller's to assert)
    pub async fn join_room(&mut self, room_id: &str) {
        self.send(ClientRequest::JoinRoom(JoinRoomParams {
            room_id: room_id.to_string(),
        }))
        .await;
    }

    /// Relay a payload to `to`
    pub async fn signal(&mut self, to: &str, signal: serde_json::Value) {
        let from = self.id.clone();
        self.send(ClientRequest::Signal(SignalEnvelope { to: to.to_string(), from, signal }))
            .await;
    }

    /// Close the connection
    pub async fn close(mut self) {
        let _ = self.socket.close(None).await;
    }
}

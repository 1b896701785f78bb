//! Full call flow: two sessions negotiating through a real broker
//!
//! Alice is pumped by hand so the test can assert between stages; Bob
//! runs under [`drive_session`] like a production client would. Media and
//! transport are test doubles; what is under test is the session state
//! machine against the real wire protocol and broker.

mod harness;

use harness::{MockFactory, MockMedia};
use paircall_protocol::{IceCandidate, ServerEvent};
use paircall_session::{
    drive_session, CallSession, CallState, MediaSource, RemoteTrack, SessionConfig, SessionEvent,
    SignalingClient, TrackKind, TransportEvent, TransportFactory,
};
use paircall_signaling::{BrokerConfig, ServerHandle, SignalingServer};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

async fn start_broker() -> ServerHandle {
    let server = SignalingServer::new(BrokerConfig {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
    });
    server.start().await.expect("failed to start broker")
}

struct Client {
    session: CallSession,
    server_events: mpsc::UnboundedReceiver<ServerEvent>,
    transport_events: mpsc::UnboundedReceiver<TransportEvent>,
    notifications: mpsc::UnboundedReceiver<SessionEvent>,
    factory: Arc<MockFactory>,
    media: Arc<MockMedia>,
}

async fn client(url: &str) -> Client {
    let signaling = SignalingClient::connect(url).await.expect("connect failed");
    let (requests_tx, server_events) = signaling.split();
    let factory = Arc::new(MockFactory::default());
    let media = Arc::new(MockMedia::default());
    let (transport_events_tx, transport_events) = mpsc::unbounded_channel();
    let (session, notifications) = CallSession::new(
        SessionConfig {
            signaling_url: url.to_string(),
            ..Default::default()
        },
        Arc::clone(&media) as Arc<dyn MediaSource>,
        Arc::clone(&factory) as Arc<dyn TransportFactory>,
        requests_tx,
        transport_events_tx,
    );
    Client {
        session,
        server_events,
        transport_events,
        notifications,
        factory,
        media,
    }
}

#[tokio::test]
async fn test_two_sessions_negotiate_and_connect() {
    let broker = start_broker().await;
    let url = format!("ws://{}", broker.local_addr());

    // Alice creates the room.
    let mut alice = client(&url).await;
    alice.session.create_room().await.unwrap();
    harness::pump_one(&mut alice.session, &mut alice.server_events).await; // connected
    harness::pump_one(&mut alice.session, &mut alice.server_events).await; // room-created
    let room_id = alice.session.room_id().expect("no room id").to_string();
    assert_eq!(alice.session.state(), CallState::Negotiating);

    // Bob joins and runs autonomously from here on.
    let mut bob = client(&url).await;
    bob.session.join_room(&room_id).await.unwrap();
    let bob_factory = Arc::clone(&bob.factory);
    let mut bob_notifications = bob.notifications;
    let bob_task = tokio::spawn(async move {
        drive_session(&mut bob.session, bob.server_events, bob.transport_events).await;
    });

    // Both sides originate offers symmetrically; let the exchange settle.
    harness::pump_for(
        &mut alice.session,
        &mut alice.server_events,
        Duration::from_millis(500),
    )
    .await;

    // Alice saw Bob's offer and answered it, and saw Bob's answer to hers.
    let alice_transport = alice.factory.transport();
    assert!(alice_transport.saw("create_offer"));
    assert!(alice_transport.saw("set_remote:offer"));
    assert!(alice_transport.saw("create_answer"));
    assert!(alice_transport.saw("set_remote:answer"));
    assert!(alice.session.peer_id().is_some());

    // Bob, driven autonomously, did the same.
    harness::wait_until("bob to negotiate", || {
        bob_factory.created_count() == 1
            && bob_factory.transport().saw("set_remote:offer")
            && bob_factory.transport().saw("set_remote:answer")
    })
    .await;

    // Alice discovers a local candidate; it must reach Bob's transport.
    alice
        .session
        .handle_transport_event(TransportEvent::LocalCandidate(IceCandidate {
            candidate: "alice-cand-0".to_string(),
            sdp_mid: Some("0".to_string()),
            sdp_m_line_index: Some(0),
        }))
        .await
        .unwrap();
    harness::wait_until("alice's candidate at bob", || {
        bob_factory.transport().saw("candidate:alice-cand-0")
    })
    .await;

    // Bob's transport discovers a candidate; it must reach Alice.
    bob_factory.emit(TransportEvent::LocalCandidate(IceCandidate {
        candidate: "bob-cand-0".to_string(),
        sdp_mid: None,
        sdp_m_line_index: None,
    }));
    harness::pump_for(
        &mut alice.session,
        &mut alice.server_events,
        Duration::from_millis(300),
    )
    .await;
    assert!(alice.factory.transport().saw("candidate:bob-cand-0"));

    // Remote media arrives at Bob: he reports Connected.
    bob_factory.emit(TransportEvent::RemoteMedia(RemoteTrack {
        id: "alice-video".to_string(),
        kind: TrackKind::Video,
    }));
    let mut bob_connected = false;
    while let Ok(Some(event)) = tokio::time::timeout(
        harness::WAIT_TIMEOUT,
        bob_notifications.recv(),
    )
    .await
    {
        if matches!(event, SessionEvent::StateChanged(CallState::Connected)) {
            bob_connected = true;
            break;
        }
    }
    assert!(bob_connected, "bob never reached Connected");

    // Alice hangs up: her transport closes and her tracks stop.
    alice.session.end_call().await;
    assert_eq!(
        alice
            .factory
            .transport()
            .close_count
            .load(std::sync::atomic::Ordering::SeqCst),
        1
    );
    assert_eq!(alice.media.stops.load(std::sync::atomic::Ordering::SeqCst), 2);
    assert_eq!(alice.session.state(), CallState::Ended);

    bob_task.abort();
    broker.shutdown().await;
}

#[tokio::test]
async fn test_join_rejection_surfaces_user_message() {
    let broker = start_broker().await;
    let url = format!("ws://{}", broker.local_addr());

    let mut carol = client(&url).await;
    carol.session.join_room("no-such-room").await.unwrap();
    harness::pump_one(&mut carol.session, &mut carol.server_events).await; // connected
    harness::pump_one(&mut carol.session, &mut carol.server_events).await; // error

    assert_eq!(carol.session.state(), CallState::Idle);
    let mut saw_failure = false;
    while let Ok(event) = carol.notifications.try_recv() {
        if let SessionEvent::Failed { message } = event {
            assert_eq!(message, "Room not found");
            saw_failure = true;
        }
    }
    assert!(saw_failure);
    // The aborted attempt released the acquired tracks.
    assert_eq!(carol.media.stops.load(std::sync::atomic::Ordering::SeqCst), 2);

    broker.shutdown().await;
}

//! Call-flow test harness
//!
//! Test doubles for the external collaborators (media source, transport
//! factory) plus small pumping helpers, so two real [`CallSession`]s can
//! negotiate through a real broker with no actual media involved.

use async_trait::async_trait;
use paircall_protocol::{IceCandidate, ServerEvent, SessionDescription};
use paircall_session::{
    CallSession, MediaConstraints, MediaSource, MediaStream, MediaTrack, Result, RtcTransport,
    SessionConfig, TrackKind, TransportEvent, TransportFactory,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout, Instant};

/// How long to wait for an expected condition before failing the test
pub const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// A recording transport double
#[derive(Default)]
pub struct MockTransport {
    ops: Mutex<Vec<String>>,
    pub close_count: AtomicUsize,
}

impl MockTransport {
    fn record(&self, op: impl Into<String>) {
        self.ops.lock().unwrap().push(op.into());
    }

    /// Operations applied to this transport, in order
    pub fn ops(&self) -> Vec<String> {
        self.ops.lock().unwrap().clone()
    }

    /// Check whether an operation with this prefix was recorded
    pub fn saw(&self, prefix: &str) -> bool {
        self.ops().iter().any(|op| op.starts_with(prefix))
    }
}

#[async_trait]
impl RtcTransport for MockTransport {
    async fn create_offer(&self) -> Result<SessionDescription> {
        self.record("create_offer");
        Ok(SessionDescription::offer("mock-offer"))
    }

    async fn create_answer(&self) -> Result<SessionDescription> {
        self.record("create_answer");
        Ok(SessionDescription::answer("mock-answer"))
    }

    async fn set_local_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(format!("set_local:{}", desc.kind));
        Ok(())
    }

    async fn set_remote_description(&self, desc: SessionDescription) -> Result<()> {
        self.record(format!("set_remote:{}", desc.kind));
        Ok(())
    }

    async fn add_ice_candidate(&self, candidate: IceCandidate) -> Result<()> {
        self.record(format!("candidate:{}", candidate.candidate));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.close_count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Factory double that keeps every created transport and its event sender
#[derive(Default)]
pub struct MockFactory {
    created: Mutex<Vec<Arc<MockTransport>>>,
    events: Mutex<Option<mpsc::UnboundedSender<TransportEvent>>>,
}

impl MockFactory {
    /// The most recently created transport
    pub fn transport(&self) -> Arc<MockTransport> {
        self.created
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no transport created")
    }

    /// Number of transports created so far
    pub fn created_count(&self) -> usize {
        self.created.lock().unwrap().len()
    }

    /// Inject a transport event, as the real transport object would
    pub fn emit(&self, event: TransportEvent) {
        self.events
            .lock()
            .unwrap()
            .as_ref()
            .expect("no transport created")
            .send(event)
            .expect("transport event channel closed");
    }
}

#[async_trait]
impl TransportFactory for MockFactory {
    async fn create(
        &self,
        _config: &SessionConfig,
        _local_stream: &dyn MediaStream,
        events: mpsc::UnboundedSender<TransportEvent>,
    ) -> Result<Arc<dyn RtcTransport>> {
        let transport = Arc::new(MockTransport::default());
        self.created.lock().unwrap().push(Arc::clone(&transport));
        *self.events.lock().unwrap() = Some(events);
        Ok(transport)
    }
}

struct MockTrack {
    id: String,
    kind: TrackKind,
    stops: Arc<AtomicUsize>,
}

impl MediaTrack for MockTrack {
    fn id(&self) -> &str {
        &self.id
    }

    fn kind(&self) -> TrackKind {
        self.kind
    }

    fn stop(&self) {
        self.stops.fetch_add(1, Ordering::SeqCst);
    }
}

struct MockStream {
    tracks: Vec<Arc<dyn MediaTrack>>,
}

impl MediaStream for MockStream {
    fn tracks(&self) -> Vec<Arc<dyn MediaTrack>> {
        self.tracks.clone()
    }
}

/// Media source double producing one audio and one video track
#[derive(Default)]
pub struct MockMedia {
    /// Total track stops across every stream this source produced
    pub stops: Arc<AtomicUsize>,
}

#[async_trait]
impl MediaSource for MockMedia {
    async fn acquire(&self, _constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>> {
        Ok(Box::new(MockStream {
            tracks: vec![
                Arc::new(MockTrack {
                    id: "audio-0".to_string(),
                    kind: TrackKind::Audio,
                    stops: Arc::clone(&self.stops),
                }),
                Arc::new(MockTrack {
                    id: "video-0".to_string(),
                    kind: TrackKind::Video,
                    stops: Arc::clone(&self.stops),
                }),
            ],
        }))
    }
}

/// Handle the next broker event, failing the test on timeout
pub async fn pump_one(
    session: &mut CallSession,
    events: &mut mpsc::UnboundedReceiver<ServerEvent>,
) {
    let event = timeout(WAIT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for broker event")
        .expect("signaling connection closed");
    session
        .handle_server_event(event)
        .await
        .expect("event handler failed");
}

/// Handle whatever broker events arrive within `window`
pub async fn pump_for(
    session: &mut CallSession,
    events: &mut mpsc::UnboundedReceiver<ServerEvent>,
    window: Duration,
) {
    let deadline = Instant::now() + window;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        match timeout(remaining, events.recv()).await {
            Ok(Some(event)) => session
                .handle_server_event(event)
                .await
                .expect("event handler failed"),
            _ => break,
        }
    }
}

/// Poll until `condition` holds, failing the test after the wait timeout
pub async fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + WAIT_TIMEOUT;
    while !condition() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        sleep(Duration::from_millis(10)).await;
    }
}

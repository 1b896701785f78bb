//! WebSocket signaling client
//!
//! Maintains the persistent connection to the broker: a writer task
//! draining queued requests and a reader task decoding broker events.
//! The writer exits when the request sender is dropped, the reader when
//! the socket closes or the event receiver is dropped; neither needs
//! explicit shutdown.

use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use paircall_protocol::{ClientRequest, ServerEvent};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, warn};

/// Client side of the signaling connection
pub struct SignalingClient {
    requests_tx: mpsc::UnboundedSender<ClientRequest>,
    events_rx: mpsc::UnboundedReceiver<ServerEvent>,
}

impl SignalingClient {
    /// Connect to the broker at `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let (socket, _) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| Error::Signaling(format!("failed to connect to {}: {}", url, e)))?;
        let (mut sink, mut source) = socket.split();

        let (requests_tx, mut requests_rx) = mpsc::unbounded_channel::<ClientRequest>();
        let (events_tx, events_rx) = mpsc::unbounded_channel::<ServerEvent>();

        tokio::spawn(async move {
            while let Some(request) = requests_rx.recv().await {
                let frame = match request.to_json() {
                    Ok(frame) => frame,
                    Err(err) => {
                        warn!(error = %err, "failed to encode request");
                        continue;
                    }
                };
                if sink.send(Message::Text(frame)).await.is_err() {
                    break;
                }
            }
        });

        tokio::spawn(async move {
            while let Some(message) = source.next().await {
                match message {
                    Ok(Message::Text(text)) => match ServerEvent::from_json(&text) {
                        Ok(event) => {
                            if events_tx.send(event).is_err() {
                                break;
                            }
                        }
                        Err(err) => {
                            warn!(error = %err, "ignoring undecodable broker event");
                        }
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        debug!(error = %err, "signaling connection error");
                        break;
                    }
                }
            }
        });

        Ok(Self {
            requests_tx,
            events_rx,
        })
    }

    /// Sender for queueing requests to the broker
    pub fn requests(&self) -> mpsc::UnboundedSender<ClientRequest> {
        self.requests_tx.clone()
    }

    /// Receive the next broker event; `None` when the connection is gone
    pub async fn next_event(&mut self) -> Option<ServerEvent> {
        self.events_rx.recv().await
    }

    /// Split into the request sender and the event receiver
    pub fn split(
        self,
    ) -> (
        mpsc::UnboundedSender<ClientRequest>,
        mpsc::UnboundedReceiver<ServerEvent>,
    ) {
        (self.requests_tx, self.events_rx)
    }
}

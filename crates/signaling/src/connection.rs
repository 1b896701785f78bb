//! Per-connection WebSocket handling
//!
//! Each accepted socket gets a registered broker identity, a writer task
//! draining the connection's outbound event queue, and a read loop feeding
//! [`Broker::dispatch`]. Whatever ends the read loop, the connection is
//! unregistered from the broker before the task exits.

use crate::broker::Broker;
use crate::{Error, Result};
use futures::{SinkExt, StreamExt};
use paircall_protocol::{ClientRequest, ServerEvent};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    broker: Arc<Broker>,
) -> Result<()> {
    let socket = tokio_tungstenite::accept_async(stream)
        .await
        .map_err(|e| Error::WebSocket(e.to_string()))?;
    let (mut sink, mut source) = socket.split();

    let (tx, mut rx) = mpsc::unbounded_channel::<ServerEvent>();
    let conn_id = broker.register(tx).await;
    info!(%conn_id, %peer_addr, "client connected");

    let writer_conn_id = conn_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let frame = match event.to_json() {
                Ok(frame) => frame,
                Err(err) => {
                    warn!(conn_id = %writer_conn_id, error = %err, "failed to encode event");
                    continue;
                }
            };
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(message) = source.next().await {
        match message {
            Ok(Message::Text(text)) => match ClientRequest::from_json(&text) {
                Ok(request) => broker.dispatch(&conn_id, request).await,
                Err(err) => {
                    warn!(%conn_id, error = %err, "malformed request frame");
                    broker
                        .notify(&conn_id, ServerEvent::error("Malformed request"))
                        .await;
                }
            },
            Ok(Message::Close(_)) => break,
            Ok(Message::Binary(_)) => {
                warn!(%conn_id, "ignoring binary frame");
            }
            // Ping/pong and raw frames are handled by the protocol layer.
            Ok(_) => {}
            Err(err) => {
                debug!(%conn_id, error = %err, "connection error");
                break;
            }
        }
    }

    broker.disconnect(&conn_id).await;
    writer.abort();
    info!(%conn_id, "client disconnected");
    Ok(())
}

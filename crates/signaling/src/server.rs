//! WebSocket signaling server
//!
//! Binds a TCP listener and accepts WebSocket connections until told to
//! shut down. One task per connection; the accept loop itself never does
//! per-connection work.

use crate::broker::Broker;
use crate::config::BrokerConfig;
use crate::connection;
use crate::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// WebSocket signaling server
pub struct SignalingServer {
    config: BrokerConfig,
    broker: Arc<Broker>,
}

impl SignalingServer {
    /// Create a new signaling server
    pub fn new(config: BrokerConfig) -> Self {
        Self {
            config,
            broker: Arc::new(Broker::new()),
        }
    }

    /// Get the broker (for inspection from tests and tooling)
    pub fn broker(&self) -> Arc<Broker> {
        Arc::clone(&self.broker)
    }

    /// Bind the listener and start accepting connections
    ///
    /// Returns a handle carrying the bound address (useful with port 0)
    /// that can be used to shut the server down.
    pub async fn start(self) -> Result<ServerHandle> {
        let addr: SocketAddr = format!("{}:{}", self.config.bind_addr, self.config.port)
            .parse()
            .map_err(|e| Error::InvalidConfig(format!("invalid listen address: {}", e)))?;

        let listener = TcpListener::bind(&addr).await?;
        let local_addr = listener.local_addr()?;
        info!("signaling server listening on ws://{}", local_addr);

        let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
        let broker = self.broker;

        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, peer_addr)) => {
                                let broker = Arc::clone(&broker);
                                tokio::spawn(async move {
                                    if let Err(err) =
                                        connection::handle_connection(stream, peer_addr, broker).await
                                    {
                                        debug!(%peer_addr, error = %err, "connection ended with error");
                                    }
                                });
                            }
                            Err(err) => {
                                error!(error = %err, "failed to accept connection");
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("signaling server shutting down");
                        break;
                    }
                }
            }
        });

        Ok(ServerHandle {
            local_addr,
            shutdown_tx,
            task,
        })
    }
}

/// Handle for controlling a running signaling server
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ServerHandle {
    /// The address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting connections and wait for the accept loop to exit
    ///
    /// Existing connections are dropped with the process; there is no
    /// per-connection drain step.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        let _ = self.task.await;
    }
}

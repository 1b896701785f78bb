//! Configuration types for the signaling broker

use serde::{Deserialize, Serialize};

/// Configuration for the signaling server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    /// Address to bind the WebSocket listener to
    pub bind_addr: String,

    /// Port to listen on (0 picks an ephemeral port)
    pub port: u16,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: 5001,
        }
    }
}

impl BrokerConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if `bind_addr` is not a valid IP address.
    pub fn validate(&self) -> crate::Result<()> {
        if self.bind_addr.parse::<std::net::IpAddr>().is_err() {
            return Err(crate::Error::InvalidConfig(format!(
                "bind_addr is not a valid IP address: {}",
                self.bind_addr
            )));
        }
        Ok(())
    }
}

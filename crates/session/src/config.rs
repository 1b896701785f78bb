//! Configuration types for call sessions

use serde::{Deserialize, Serialize};

/// Main configuration for a call session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// WebSocket signaling broker URL (ws:// or wss://)
    pub signaling_url: String,

    /// STUN server URLs handed to the transport factory (at least one)
    pub stun_servers: Vec<String>,

    /// Capture constraints handed to the media source
    pub media: MediaConstraints,
}

/// Capture constraints for local media
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaConstraints {
    /// Video capture constraints
    pub video: VideoConstraints,

    /// Audio capture constraints
    pub audio: AudioConstraints,
}

/// Video capture constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoConstraints {
    /// Ideal capture width in pixels
    pub width: u32,

    /// Ideal capture height in pixels
    pub height: u32,

    /// Camera facing preference ("user" or "environment")
    pub facing_mode: String,
}

/// Audio capture constraints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConstraints {
    /// Enable echo cancellation
    pub echo_cancellation: bool,

    /// Enable noise suppression
    pub noise_suppression: bool,

    /// Enable automatic gain control
    pub auto_gain_control: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            signaling_url: "ws://localhost:5001".to_string(),
            stun_servers: vec![
                "stun:stun.l.google.com:19302".to_string(),
                "stun:stun1.l.google.com:19302".to_string(),
            ],
            media: MediaConstraints::default(),
        }
    }
}

impl Default for MediaConstraints {
    fn default() -> Self {
        Self {
            video: VideoConstraints {
                width: 1280,
                height: 720,
                facing_mode: "user".to_string(),
            },
            audio: AudioConstraints {
                echo_cancellation: true,
                noise_suppression: true,
                auto_gain_control: true,
            },
        }
    }
}

impl SessionConfig {
    /// Validate configuration parameters
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `signaling_url` is not a WebSocket URL
    /// - `stun_servers` is empty
    pub fn validate(&self) -> crate::Result<()> {
        use crate::Error;

        if !self.signaling_url.starts_with("ws://") && !self.signaling_url.starts_with("wss://") {
            return Err(Error::InvalidConfig(format!(
                "signaling_url must start with ws:// or wss://, got {}",
                self.signaling_url
            )));
        }

        if self.stun_servers.is_empty() {
            return Err(Error::InvalidConfig(
                "At least one STUN server is required".to_string(),
            ));
        }

        Ok(())
    }
}

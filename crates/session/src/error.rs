//! Error types for call sessions

/// Result type alias using session Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while setting up or running a call
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// User denied access to capture devices
    #[error("media access denied")]
    MediaAccessDenied,

    /// No capture device present
    #[error("no media input device found")]
    MediaDeviceNotFound,

    /// Any other capture failure
    #[error("media error: {0}")]
    MediaAccess(String),

    /// Transport object operation failed
    #[error("transport error: {0}")]
    Transport(String),

    /// Signaling connection or channel failure
    #[error("signaling error: {0}")]
    Signaling(String),

    /// A call is already in progress on this session
    #[error("call already in progress")]
    CallInProgress,

    /// Wire protocol encode/decode failure
    #[error(transparent)]
    Protocol(#[from] paircall_protocol::Error),
}

impl Error {
    /// Check if this error came from media capture
    pub fn is_media_error(&self) -> bool {
        matches!(
            self,
            Error::MediaAccessDenied | Error::MediaDeviceNotFound | Error::MediaAccess(_)
        )
    }

    /// User-facing message for surfacing in a call UI
    pub fn user_message(&self) -> String {
        match self {
            Error::MediaAccessDenied => {
                "Camera and microphone access denied. Please allow permissions and try again."
                    .to_string()
            }
            Error::MediaDeviceNotFound => {
                "No camera or microphone found. Please check your devices.".to_string()
            }
            Error::MediaAccess(_) => {
                "Failed to access camera and microphone. Please check your devices and permissions."
                    .to_string()
            }
            other => other.to_string(),
        }
    }
}

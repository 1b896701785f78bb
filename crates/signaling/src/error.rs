//! Error types for the signaling broker

/// Result type alias using broker Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in broker operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration parameter
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Join target does not exist
    #[error("Room not found: {0}")]
    RoomNotFound(String),

    /// Join target already holds two participants
    #[error("Room is full: {0}")]
    RoomFull(String),

    /// WebSocket handshake or framing error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Check if this error is a failed client request
    ///
    /// Request errors are reported to the requester as an `error` event;
    /// they never mutate shared state and never affect other connections.
    pub fn is_request_error(&self) -> bool {
        matches!(self, Error::RoomNotFound(_) | Error::RoomFull(_))
    }

    /// The wire message for a failed client request, if this is one
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            Error::RoomNotFound(_) => Some("Room not found"),
            Error::RoomFull(_) => Some("Room is full"),
            _ => None,
        }
    }
}

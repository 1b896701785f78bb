//! Error types for protocol encoding and decoding

/// Result type alias using protocol Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while encoding or decoding wire messages
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Frame was not valid JSON or did not match any known message shape
    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}

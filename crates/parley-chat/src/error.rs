//! Error types for parley-chat

use thiserror::Error;

/// Result type alias using parley-chat Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the chat core
#[derive(Error, Debug)]
pub enum Error {
    /// An error from the provider layer
    #[error(transparent)]
    Ai(#[from] parley_ai::Error),

    /// An error during compaction (string-based for flexibility)
    #[error("Compaction error: {0}")]
    Compaction(String),

    /// A second turn was started while one was already in flight
    #[error("A turn is already in flight for this session")]
    TurnInFlight,
}

impl Error {
    /// Check if this error is an authentication/credential failure
    pub fn is_auth(&self) -> bool {
        match self {
            Error::Ai(e) => e.is_auth(),
            _ => false,
        }
    }
}

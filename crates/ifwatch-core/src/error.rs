//! Error types for the ifwatch system
//!
//! Only channel setup and startup enumeration cross a component boundary as
//! errors. Malformed notifications and mutations against unknown interfaces
//! are absorbed where they happen.

use thiserror::Error;

/// Result type alias for ifwatch operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the ifwatch system
#[derive(Error, Debug)]
pub enum Error {
    /// Notification channel could not be created or bound
    #[error("Socket error: {0}")]
    Socket(String),

    /// Startup interface enumeration failed
    #[error("Enumeration error: {0}")]
    Enumeration(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a socket error
    pub fn socket(msg: impl Into<String>) -> Self {
        Self::Socket(msg.into())
    }

    /// Create an enumeration error
    pub fn enumeration(msg: impl Into<String>) -> Self {
        Self::Enumeration(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error means the monitor cannot start at all
    ///
    /// The daemon maps fatal errors to its configuration exit code.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Socket(_) | Self::Config(_))
    }
}

//! Error types for session persistence.

use thiserror::Error;

use portunus_core::PortunusError;

/// Result type for codec and session-store operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors produced by persistence codecs and the session store.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Filesystem I/O failed.
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),

    /// A document could not be serialized or deserialized.
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The storage engine failed.
    #[error("storage failure: {0}")]
    Storage(String),

    /// The key contains characters the backend cannot represent.
    #[error("invalid key {0:?}")]
    InvalidKey(String),

    /// The backend cannot support this operation (best-effort contract).
    ///
    /// Callers treat this as a no-op, not a failure: a backend without
    /// timestamp metadata reports `purge` this way.
    #[error("operation not supported: {0}")]
    Unsupported(&'static str),
}

impl SessionError {
    /// Wraps a storage-engine failure.
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }
}

impl From<SessionError> for PortunusError {
    fn from(err: SessionError) -> Self {
        PortunusError::persistence_with("session persistence failed", err)
    }
}

//! Error types for the standalone store.

use proscale_core::ClientError;
use thiserror::Error;

/// Result type alias for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors that can occur during state store operations.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to open database: {0}")]
    Open(String),

    #[error("transaction error: {0}")]
    Transaction(String),

    #[error("table error: {0}")]
    Table(String),

    #[error("read error: {0}")]
    Read(String),

    #[error("write error: {0}")]
    Write(String),

    #[error("serialization error: {0}")]
    Serialize(String),

    #[error("deserialization error: {0}")]
    Deserialize(String),

    #[error("{kind} {key:?} not found")]
    NotFound { kind: &'static str, key: String },

    #[error("{kind} {key:?} already exists")]
    AlreadyExists { kind: &'static str, key: String },
}

impl From<StateError> for ClientError {
    fn from(e: StateError) -> Self {
        match e {
            StateError::NotFound { kind, key } => ClientError::NotFound { kind, name: key },
            StateError::AlreadyExists { kind, key } => {
                ClientError::AlreadyExists { kind, name: key }
            }
            StateError::Open(_) | StateError::Transaction(_) => {
                ClientError::Unavailable(e.to_string())
            }
            other => ClientError::Backend(other.to_string()),
        }
    }
}

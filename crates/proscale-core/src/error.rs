//! Errors reported by the external collaborators.

use thiserror::Error;

/// Result type alias for collaborator calls.
pub type ClientResult<T> = Result<T, ClientError>;

/// Failures surfaced by a cluster status provider, config store, or
/// scale target updater.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{kind} {name:?} not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} {name:?} already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("unsupported target kind: {0}")]
    UnsupportedKind(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

impl ClientError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

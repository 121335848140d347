//! Policy parsing and resolution errors.

use thiserror::Error;

use crate::PolicyKind;

pub type PolicyResult<T> = Result<T, PolicyError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// Malformed JSON or a semantically invalid table or parameter.
    #[error("error parsing {kind} params: {reason}")]
    ConfigParseInvalid { kind: PolicyKind, reason: String },

    /// The configuration must name exactly one policy variant.
    #[error("invalid config format, expected exactly one entry, got {}: [{}]", .keys.len(), .keys.join(", "))]
    AmbiguousPolicyConfig { keys: Vec<String> },

    #[error("not a supported control mode: {0:?}")]
    UnsupportedPolicyVariant(String),
}

impl PolicyError {
    pub(crate) fn invalid(kind: PolicyKind, reason: impl Into<String>) -> Self {
        Self::ConfigParseInvalid {
            kind,
            reason: reason.into(),
        }
    }
}

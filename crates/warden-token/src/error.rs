//! Error types for the token crate.

use std::fmt;
use thiserror::Error;

/// Why a token failed verification.
///
/// These are internal classifications. Callers of the mutation path only ever
/// see a single collapsed error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenFailure {
    /// Structurally invalid token string.
    Malformed,
    /// Signature does not match the payload.
    InvalidSignature,
    /// Issued outside the TTL window.
    Expired,
    /// Payload parameters differ from the current call.
    ParameterMismatch,
}

impl TokenFailure {
    pub fn code(self) -> &'static str {
        match self {
            Self::Malformed => "MALFORMED_TOKEN",
            Self::InvalidSignature => "INVALID_TOKEN",
            Self::Expired => "EXPIRED_TOKEN",
            Self::ParameterMismatch => "PARAMETER_MISMATCH",
        }
    }
}

impl fmt::Display for TokenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Errors that can occur while issuing or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Token string could not be parsed.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// Signature mismatch. Forged and tampered tokens are not distinguished.
    #[error("invalid token signature")]
    InvalidSignature,

    /// Token timestamp is outside the TTL window.
    #[error("token issued at {issued_at} is outside the {ttl_seconds}s window (now {now})")]
    Expired {
        issued_at: i64,
        now: i64,
        ttl_seconds: u64,
    },

    /// Token was issued for different parameters.
    #[error("token parameters do not match the request (field: {field})")]
    ParameterMismatch { field: String },

    /// The caller tried to encode a field the codec sets itself.
    #[error("parameter '{0}' is reserved")]
    ReservedField(String),

    /// Parameters are nested deeper than a token payload may be.
    #[error("parameters nest deeper than {limit} levels")]
    NestingTooDeep { limit: usize },

    /// Signing secret is unusable.
    #[error("invalid signing secret: {0}")]
    InvalidSecret(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error (reading secrets from files).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TokenError {
    /// The verification failure class, if this error came out of verification.
    pub fn failure(&self) -> Option<TokenFailure> {
        match self {
            Self::Malformed(_) => Some(TokenFailure::Malformed),
            Self::InvalidSignature => Some(TokenFailure::InvalidSignature),
            Self::Expired { .. } => Some(TokenFailure::Expired),
            Self::ParameterMismatch { .. } => Some(TokenFailure::ParameterMismatch),
            _ => None,
        }
    }
}

//! Error types for the gateway crate.

use crate::identity::IdentityError;
use crate::shape::ShapeError;
use crate::store::PolicyStoreError;
use thiserror::Error;
use warden_audit::AuditError;
use warden_token::TokenError;

/// Errors from the preview service.
#[derive(Debug, Error)]
pub enum PreviewError {
    /// Request is missing required fields or carries unexpected ones.
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] ShapeError),

    /// Token could not be issued.
    #[error("failed to issue approval token: {0}")]
    Token(#[from] TokenError),

    /// Expiry time is outside the representable range.
    #[error("token issued at {issued_at} with a {ttl_seconds}s TTL has no representable expiry")]
    InvalidExpiry { issued_at: i64, ttl_seconds: u64 },
}

impl PreviewError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Token(_) | Self::InvalidExpiry { .. } => "INTERNAL",
        }
    }
}

/// Authorization gate decisions other than "allowed".
#[derive(Debug, Error)]
pub enum GateError {
    /// Caller is not a member of the admin group.
    #[error("caller '{identity}' is not permitted to change policies")]
    Denied { identity: String },

    /// Group memberships could not be resolved. The gate fails closed.
    #[error("could not resolve caller identity: {0}")]
    IdentityUnavailable(#[from] IdentityError),
}

/// Errors returned by the mutation dispatcher.
///
/// Token failures are deliberately collapsed into one variant. The specific
/// reason is only recorded in the audit trail.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No approval token was supplied.
    #[error("an approval token is required; preview the change first")]
    MissingApprovalToken,

    /// Caller is not a member of the admin group.
    #[error("permission denied: caller '{identity}' is not permitted to change policies")]
    PermissionDenied { identity: String },

    /// Token is forged, tampered, expired, or was issued for other parameters.
    #[error("approval token is invalid or expired; preview the change again")]
    InvalidOrExpiredToken,

    /// Request is not well formed for its action.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Caller identity could not be resolved.
    #[error("identity unavailable: {0}")]
    IdentityUnavailable(String),

    /// Error from the policy store, passed through unchanged.
    #[error(transparent)]
    Store(#[from] PolicyStoreError),
}

impl DispatchError {
    /// Stable, caller-visible error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingApprovalToken => "MISSING_APPROVAL_TOKEN",
            Self::PermissionDenied { .. } => "PERMISSION_DENIED",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::IdentityUnavailable(_) => "IDENTITY_UNAVAILABLE",
            Self::Store(e) => e.code(),
        }
    }
}

impl From<GateError> for DispatchError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Denied { identity } => Self::PermissionDenied { identity },
            GateError::IdentityUnavailable(e) => Self::IdentityUnavailable(e.to_string()),
        }
    }
}

impl From<ShapeError> for DispatchError {
    fn from(err: ShapeError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

/// Errors constructing a [`crate::Gateway`].
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Signing secret could not be loaded.
    #[error("signing secret error: {0}")]
    Secret(#[from] TokenError),

    /// Audit sink could not be initialized.
    #[error("audit error: {0}")]
    Audit(#[from] AuditError),
}

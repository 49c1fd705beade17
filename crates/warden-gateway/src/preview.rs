//! Preview service: the non-mutating half of the approval protocol.

use crate::error::PreviewError;
use crate::render::{describe, render_statement};
use crate::shape::MutationPlan;
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use std::sync::Arc;
use warden_audit::AuditLogger;
use warden_core::ChangeRequest;
use warden_token::{token_reference, TokenCodec};

/// What an operator reviews before approving a change.
#[derive(Debug, Clone, Serialize)]
pub struct Preview {
    pub description: String,
    pub statement: String,
    pub approval_token: String,
    /// Non-secret handle for the token, as it appears in the audit trail.
    pub token_ref: String,
    pub expires_at: DateTime<Utc>,
}

/// Renders a change request and issues an approval token for it.
///
/// Never touches the policy store, so it is safe to call any number of times.
#[derive(Clone)]
pub struct PreviewService {
    codec: TokenCodec,
    audit: Arc<AuditLogger>,
}

impl PreviewService {
    pub fn new(codec: TokenCodec, audit: Arc<AuditLogger>) -> Self {
        Self { codec, audit }
    }

    pub async fn preview(&self, request: &ChangeRequest) -> Result<Preview, PreviewError> {
        let plan = MutationPlan::from_request(request)?;
        let statement = render_statement(&plan);
        let description = describe(&plan);

        // One clock read for both the token stamp and the reported expiry
        let issued_at = self.codec.now_unix();
        let expires_at = expiry(issued_at, self.codec.ttl_seconds())?;
        let approval_token = self.codec.encode_at(&request.token_params(), issued_at)?;
        let token_ref = token_reference(&approval_token);

        tracing::info!(
            action = %request.action(),
            policy = %request.target_name(),
            scope = %request.scope(),
            token_ref = %token_ref,
            "Issued change preview"
        );
        self.audit
            .log_preview_issued(
                request.action().as_str(),
                request.target_name(),
                &request.scope().to_string(),
                &statement,
                &token_ref,
            )
            .await;

        Ok(Preview {
            description,
            statement,
            approval_token,
            token_ref,
            expires_at,
        })
    }
}

fn expiry(issued_at: i64, ttl_seconds: u64) -> Result<DateTime<Utc>, PreviewError> {
    let invalid = || PreviewError::InvalidExpiry {
        issued_at,
        ttl_seconds,
    };
    let ttl = i64::try_from(ttl_seconds)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .ok_or_else(invalid)?;
    DateTime::from_timestamp(issued_at, 0)
        .and_then(|issued| issued.checked_add_signed(ttl))
        .ok_or_else(invalid)
}

//! Mutation dispatcher: the single gated entry point for CREATE, UPDATE and
//! DELETE.
//!
//! Order is fixed and the first failure ends the call:
//!
//! 1. authorization gate (fresh identity lookup)
//! 2. expected action, when the caller named one
//! 3. approval token present
//! 4. token verified against the *current* request
//! 5. request shape
//! 6. forward to the policy store, relay its result
//!
//! Nothing is retried and nothing is remembered between calls.

use crate::error::{DispatchError, GateError};
use crate::gate::AuthorizationGate;
use crate::shape::MutationPlan;
use crate::store::PolicyStore;
use serde::Serialize;
use std::sync::Arc;
use warden_audit::AuditLogger;
use warden_core::{Action, ChangeRequest, Policy, Scope};
use warden_token::{token_reference, TokenCodec};

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MutationOutcome {
    Created(Policy),
    Updated(Policy),
    Deleted { name: String, scope: Scope },
}

impl MutationOutcome {
    /// The stored policy, for creates and updates.
    pub fn policy(&self) -> Option<&Policy> {
        match self {
            Self::Created(p) | Self::Updated(p) => Some(p),
            Self::Deleted { .. } => None,
        }
    }
}

/// Validates authorization and approval, then forwards to the policy store.
#[derive(Clone)]
pub struct MutationDispatcher {
    gate: AuthorizationGate,
    codec: TokenCodec,
    store: Arc<dyn PolicyStore>,
    audit: Arc<AuditLogger>,
}

impl MutationDispatcher {
    pub fn new(
        gate: AuthorizationGate,
        codec: TokenCodec,
        store: Arc<dyn PolicyStore>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        Self {
            gate,
            codec,
            store,
            audit,
        }
    }

    /// Execute `request` if the caller is an admin and `approval_token` was
    /// issued for exactly this request within the TTL.
    pub async fn dispatch(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<MutationOutcome, DispatchError> {
        self.run(request, approval_token, None).await
    }

    /// Like [`dispatch`](Self::dispatch), but also rejects requests whose
    /// action is not `expected`. The action is checked after the gate.
    pub async fn dispatch_expecting(
        &self,
        expected: Action,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<MutationOutcome, DispatchError> {
        self.run(request, approval_token, Some(expected)).await
    }

    async fn run(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
        expected: Option<Action>,
    ) -> Result<MutationOutcome, DispatchError> {
        let action = request.action().as_str();
        let policy = request.target_name();
        let scope_label = request.scope().to_string();

        let caller = match self.gate.check().await {
            Ok(caller) => caller,
            Err(e) => {
                let who = match &e {
                    GateError::Denied { identity } => identity.as_str(),
                    GateError::IdentityUnavailable(_) => "<unresolved>",
                };
                tracing::warn!(caller = who, action, policy, scope = %scope_label, error = %e, "Mutation denied");
                self.audit
                    .log_permission_denied(who, action, policy, &scope_label, &e.to_string())
                    .await;
                return Err(e.into());
            }
        };
        let identity = caller.identity.as_str();

        if let Some(expected) = expected.filter(|e| *e != request.action()) {
            let err = DispatchError::InvalidRequest(format!(
                "expected a {} request, got {}",
                expected,
                request.action()
            ));
            return Err(self.reject(identity, request, &scope_label, err).await);
        }

        let token = match approval_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => token,
            None => {
                let err = DispatchError::MissingApprovalToken;
                return Err(self.reject(identity, request, &scope_label, err).await);
            }
        };
        let token_ref = token_reference(token);

        if let Err(e) = self.codec.verify(token, &request.token_params()) {
            let reason = e.failure().map(|f| f.code()).unwrap_or("TOKEN_ERROR");
            tracing::warn!(
                caller = identity,
                action,
                policy,
                token_ref = %token_ref,
                reason,
                "Approval token rejected"
            );
            self.audit
                .log_token_rejected(identity, action, policy, &scope_label, &token_ref, reason)
                .await;
            return Err(DispatchError::InvalidOrExpiredToken);
        }

        let plan = match MutationPlan::from_request(request) {
            Ok(plan) => plan,
            Err(e) => return Err(self.reject(identity, request, &scope_label, e.into()).await),
        };

        tracing::debug!(caller = identity, action, policy, "Forwarding to policy store");
        let result = match plan {
            MutationPlan::Create(info) => self.store.create(info).await.map(MutationOutcome::Created),
            MutationPlan::Update {
                name,
                scope,
                update,
            } => {
                let mask = update.field_mask();
                self.store
                    .update(&name, &scope, update, &mask)
                    .await
                    .map(MutationOutcome::Updated)
            }
            MutationPlan::Delete { name, scope } => self
                .store
                .delete(&name, &scope)
                .await
                .map(|()| MutationOutcome::Deleted { name, scope }),
        };

        match result {
            Ok(outcome) => {
                tracing::info!(caller = identity, action, policy, scope = %scope_label, "Mutation executed");
                self.audit
                    .log_mutation_executed(identity, action, policy, &scope_label, &token_ref)
                    .await;
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(
                    caller = identity,
                    action,
                    policy,
                    code = e.code(),
                    error = %e,
                    "Mutation failed"
                );
                self.audit
                    .log_mutation_failed(identity, action, policy, &scope_label, &token_ref, &e.to_string())
                    .await;
                Err(e.into())
            }
        }
    }

    /// Log and audit a caller error raised after the gate passed.
    async fn reject(
        &self,
        identity: &str,
        request: &ChangeRequest,
        scope_label: &str,
        err: DispatchError,
    ) -> DispatchError {
        let action = request.action().as_str();
        let policy = request.target_name();
        tracing::warn!(caller = identity, action, policy, code = err.code(), error = %err, "Request rejected");
        self.audit
            .log_request_rejected(identity, action, policy, scope_label, err.code())
            .await;
        err
    }
}

//! Audit event types.
//!
//! One event per gateway decision. Format: `[caller - action - target - scope]`
//! plus whatever the decision needs (statement, token reference, reason).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Type of audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    /// A change was previewed and an approval token issued.
    PreviewIssued,
    /// Caller is not in the admin group.
    PermissionDenied,
    /// Approval token failed verification.
    TokenRejected,
    /// Request rejected for a caller error: no token, wrong action, bad shape.
    RequestRejected,
    /// Mutation forwarded to the policy store and succeeded.
    MutationExecuted,
    /// Policy store rejected or failed the mutation.
    MutationFailed,
    /// Read-only listing or lookup.
    PolicyRead,
}

impl std::fmt::Display for AuditEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PreviewIssued => write!(f, "PREVIEW_ISSUED"),
            Self::PermissionDenied => write!(f, "PERMISSION_DENIED"),
            Self::TokenRejected => write!(f, "TOKEN_REJECTED"),
            Self::RequestRejected => write!(f, "REQUEST_REJECTED"),
            Self::MutationExecuted => write!(f, "MUTATION_EXECUTED"),
            Self::MutationFailed => write!(f, "MUTATION_FAILED"),
            Self::PolicyRead => write!(f, "POLICY_READ"),
        }
    }
}

/// An audit event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Unique event ID.
    pub event_id: Uuid,

    /// When the event occurred.
    pub occurred_at: DateTime<Utc>,

    /// Event type.
    pub event_type: AuditEventType,

    /// Action (CREATE, UPDATE, DELETE, LIST, GET).
    pub action: String,

    /// Caller identity, once resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,

    /// Target policy name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,

    /// Scope, e.g. `SCHEMA prod.finance`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    /// Rendered statement shown to the approver.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,

    /// Signature prefix of the approval token. Links a preview to its execution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_ref: Option<String>,

    /// Internal reason code (e.g. `EXPIRED_TOKEN`). Never shown to callers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Error message from a failed mutation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Additional metadata.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub meta: serde_json::Value,
}

impl AuditEvent {
    /// Create a new audit event with the given type and action.
    pub fn new(event_type: AuditEventType, action: impl Into<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            occurred_at: Utc::now(),
            event_type,
            action: action.into(),
            caller: None,
            target: None,
            scope: None,
            statement: None,
            token_ref: None,
            reason: None,
            error: None,
            meta: serde_json::Value::Null,
        }
    }

    /// Create a builder for an audit event.
    pub fn builder(event_type: AuditEventType, action: impl Into<String>) -> AuditEventBuilder {
        AuditEventBuilder {
            event: Self::new(event_type, action),
        }
    }

    /// Format the event as a human-readable log line.
    ///
    /// Format: `[timestamp] EVENT_TYPE action=... [caller=...] [target=...] ...`
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "[{}] {} action={}",
            self.occurred_at.format("%Y-%m-%dT%H:%M:%S%.3fZ"),
            self.event_type,
            self.action,
        );

        if let Some(ref caller) = self.caller {
            line.push_str(&format!(" caller={}", caller));
        }
        if let Some(ref target) = self.target {
            line.push_str(&format!(" target={}", target));
        }
        if let Some(ref scope) = self.scope {
            line.push_str(&format!(" scope=\"{}\"", scope));
        }
        if let Some(ref token_ref) = self.token_ref {
            line.push_str(&format!(" token={}", token_ref));
        }
        if let Some(ref reason) = self.reason {
            line.push_str(&format!(" reason={}", reason));
        }
        if let Some(ref error) = self.error {
            line.push_str(&format!(" error=\"{}\"", error.replace('"', "'")));
        }

        line
    }
}

/// Builder for creating audit events.
#[derive(Debug)]
pub struct AuditEventBuilder {
    event: AuditEvent,
}

impl AuditEventBuilder {
    pub fn caller(mut self, caller: impl Into<String>) -> Self {
        self.event.caller = Some(caller.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.event.target = Some(target.into());
        self
    }

    pub fn scope(mut self, scope: impl Into<String>) -> Self {
        self.event.scope = Some(scope.into());
        self
    }

    pub fn statement(mut self, statement: impl Into<String>) -> Self {
        self.event.statement = Some(statement.into());
        self
    }

    pub fn token_ref(mut self, token_ref: impl Into<String>) -> Self {
        self.event.token_ref = Some(token_ref.into());
        self
    }

    pub fn reason(mut self, reason: impl Into<String>) -> Self {
        self.event.reason = Some(reason.into());
        self
    }

    pub fn error(mut self, error: impl Into<String>) -> Self {
        self.event.error = Some(error.into());
        self
    }

    pub fn meta(mut self, meta: serde_json::Value) -> Self {
        self.event.meta = meta;
        self
    }

    pub fn build(self) -> AuditEvent {
        self.event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_line() {
        let event = AuditEvent::builder(AuditEventType::TokenRejected, "CREATE")
            .caller("bob@example.com")
            .target("mask_ssn")
            .scope("SCHEMA prod.finance")
            .token_ref("0123456789abcdef")
            .reason("EXPIRED_TOKEN")
            .build();

        let line = event.to_log_line();
        assert!(line.contains("TOKEN_REJECTED action=CREATE"));
        assert!(line.contains("caller=bob@example.com"));
        assert!(line.contains("scope=\"SCHEMA prod.finance\""));
        assert!(line.contains("reason=EXPIRED_TOKEN"));
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let event = AuditEvent::new(AuditEventType::PolicyRead, "LIST");
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event_type"], "policy_read");
        assert!(value.get("caller").is_none());
        assert!(value.get("meta").is_none());
    }
}

//! Audit logger implementation.
//!
//! Provides the main `AuditLogger` type with helper methods for each gateway
//! decision: previews, denials, token rejections, executions and reads.

use crate::error::AuditError;
use crate::event::{AuditEvent, AuditEventType};
use crate::storage::{create_storage, AuditStorage, MemoryStorage, NullStorage};
use std::sync::Arc;
use warden_core::AuditConfig;

/// The main audit logger.
pub struct AuditLogger {
    enabled: bool,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Create a new audit logger with the given configuration.
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        Ok(Self {
            enabled: config.enabled,
            storage: Arc::from(create_storage(config)?),
        })
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(storage: Arc<dyn AuditStorage>) -> Self {
        Self {
            enabled: true,
            storage,
        }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            storage: Arc::new(NullStorage),
        }
    }

    /// Create a logger backed by memory, returning the storage for inspection.
    pub fn in_memory() -> (Self, Arc<MemoryStorage>) {
        let storage = Arc::new(MemoryStorage::new());
        (Self::with_storage(storage.clone()), storage)
    }

    /// Check if logging is enabled.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log an audit event.
    pub async fn log(&self, event: AuditEvent) -> Result<(), AuditError> {
        if !self.enabled {
            return Ok(());
        }

        tracing::debug!(
            event_id = %event.event_id,
            event_type = %event.event_type,
            action = %event.action,
            "Audit event"
        );

        self.storage.store(event).await
    }

    /// Log an event, downgrading a storage failure to a warning.
    ///
    /// Gateway decisions never change because the audit sink is unavailable.
    pub async fn record(&self, event: AuditEvent) {
        let event_type = event.event_type;
        if let Err(e) = self.log(event).await {
            tracing::warn!(event_type = %event_type, error = %e, "Failed to write audit event");
        }
    }

    /// A preview was rendered and a token issued.
    pub async fn log_preview_issued(
        &self,
        action: &str,
        target: &str,
        scope: &str,
        statement: &str,
        token_ref: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::PreviewIssued, action)
            .target(target)
            .scope(scope)
            .statement(statement)
            .token_ref(token_ref)
            .build();
        self.record(event).await;
    }

    /// Caller failed the admin-group check.
    pub async fn log_permission_denied(
        &self,
        caller: &str,
        action: &str,
        target: &str,
        scope: &str,
        reason: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::PermissionDenied, action)
            .caller(caller)
            .target(target)
            .scope(scope)
            .reason(reason)
            .build();
        self.record(event).await;
    }

    /// Token verification failed. `reason` is the internal failure code.
    pub async fn log_token_rejected(
        &self,
        caller: &str,
        action: &str,
        target: &str,
        scope: &str,
        token_ref: &str,
        reason: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::TokenRejected, action)
            .caller(caller)
            .target(target)
            .scope(scope)
            .token_ref(token_ref)
            .reason(reason)
            .build();
        self.record(event).await;
    }

    /// Admin caller sent a request that cannot be executed as sent.
    /// `reason` is the caller-visible error code.
    pub async fn log_request_rejected(
        &self,
        caller: &str,
        action: &str,
        target: &str,
        scope: &str,
        reason: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::RequestRejected, action)
            .caller(caller)
            .target(target)
            .scope(scope)
            .reason(reason)
            .build();
        self.record(event).await;
    }

    /// Mutation succeeded at the policy store.
    pub async fn log_mutation_executed(
        &self,
        caller: &str,
        action: &str,
        target: &str,
        scope: &str,
        token_ref: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::MutationExecuted, action)
            .caller(caller)
            .target(target)
            .scope(scope)
            .token_ref(token_ref)
            .build();
        self.record(event).await;
    }

    /// Policy store rejected or failed the mutation.
    pub async fn log_mutation_failed(
        &self,
        caller: &str,
        action: &str,
        target: &str,
        scope: &str,
        token_ref: &str,
        error: &str,
    ) {
        let event = AuditEvent::builder(AuditEventType::MutationFailed, action)
            .caller(caller)
            .target(target)
            .scope(scope)
            .token_ref(token_ref)
            .error(error)
            .build();
        self.record(event).await;
    }

    /// Read-only listing or lookup.
    pub async fn log_policy_read(&self, action: &str, target: Option<&str>, scope: &str) {
        let mut builder = AuditEvent::builder(AuditEventType::PolicyRead, action).scope(scope);
        if let Some(target) = target {
            builder = builder.target(target);
        }
        self.record(builder.build()).await;
    }

    /// Query audit events with filters.
    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<AuditEvent>, AuditError> {
        self.storage.query(filter).await
    }

    /// Get an audit event by ID.
    pub async fn get(&self, event_id: uuid::Uuid) -> Result<Option<AuditEvent>, AuditError> {
        self.storage.get(event_id).await
    }

    /// Every event carrying the given token reference, oldest first.
    pub async fn trail_for_token(&self, token_ref: &str) -> Result<Vec<AuditEvent>, AuditError> {
        self.query(AuditFilter {
            token_ref: Some(token_ref.to_string()),
            ..Default::default()
        })
        .await
    }
}

/// Filter for querying audit events.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    /// Filter by caller identity.
    pub caller: Option<String>,
    /// Filter by action.
    pub action: Option<String>,
    /// Filter by target policy name.
    pub target: Option<String>,
    /// Filter by token reference.
    pub token_ref: Option<String>,
    /// Filter by event type.
    pub event_type: Option<AuditEventType>,
    /// Filter by start time.
    pub start_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Filter by end time.
    pub end_time: Option<chrono::DateTime<chrono::Utc>>,
    /// Maximum number of results.
    pub limit: Option<usize>,
    /// Offset for pagination.
    pub offset: Option<usize>,
}

impl AuditFilter {
    fn matches(&self, e: &AuditEvent) -> bool {
        fn field_matches(want: &Option<String>, have: Option<&String>) -> bool {
            want.as_ref().is_none_or(|w| have == Some(w))
        }

        field_matches(&self.caller, e.caller.as_ref())
            && field_matches(&self.action, Some(&e.action))
            && field_matches(&self.target, e.target.as_ref())
            && field_matches(&self.token_ref, e.token_ref.as_ref())
            && self.event_type.is_none_or(|t| e.event_type == t)
            && self.start_time.is_none_or(|start| e.occurred_at >= start)
            && self.end_time.is_none_or(|end| e.occurred_at <= end)
    }

    /// Apply the filter, offset and limit to a sequence of events.
    pub fn apply<'a>(&self, events: impl Iterator<Item = &'a AuditEvent>) -> Vec<AuditEvent> {
        events
            .filter(|e| self.matches(e))
            .skip(self.offset.unwrap_or(0))
            .take(self.limit.unwrap_or(usize::MAX))
            .cloned()
            .collect()
    }
}

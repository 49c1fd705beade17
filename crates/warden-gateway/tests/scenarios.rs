//! End-to-end approval scenarios against the in-memory collaborators.

use pretty_assertions::assert_eq;
use std::sync::Arc;
use warden_audit::{AuditEventType, AuditLogger, MemoryStorage};
use warden_core::{Action, Caller, ChangeRequest, PolicyType, Scope, WardenConfig};
use warden_gateway::{Gateway, InMemoryPolicyStore, PolicyStoreError, StaticIdentityProvider};
use warden_token::{ManualClock, SigningSecret};

const T0: i64 = 1_700_000_000;

struct Harness {
    gateway: Gateway,
    clock: Arc<ManualClock>,
    store: Arc<InMemoryPolicyStore>,
    identity: Arc<StaticIdentityProvider>,
    audit: Arc<MemoryStorage>,
}

fn harness() -> Harness {
    harness_with_secret("scenario-secret")
}

fn harness_with_secret(secret: &str) -> Harness {
    let clock = Arc::new(ManualClock::at(T0));
    let store = Arc::new(InMemoryPolicyStore::new());
    let identity = Arc::new(StaticIdentityProvider::new(admin()));
    let (logger, audit) = AuditLogger::in_memory();

    let gateway = Gateway::builder(WardenConfig::default(), store.clone(), identity.clone())
        .secret(SigningSecret::from_text(secret).unwrap())
        .clock(clock.clone())
        .audit_logger(Arc::new(logger))
        .build()
        .unwrap();

    Harness {
        gateway,
        clock,
        store,
        identity,
        audit,
    }
}

fn admin() -> Caller {
    Caller::new("alice@example.com", ["admins", "analysts"])
}

fn finance() -> Scope {
    Scope::schema("prod.finance").unwrap()
}

fn create_mask(name: &str) -> ChangeRequest {
    ChangeRequest::builder(Action::Create, name, finance())
        .policy_type(PolicyType::ColumnMask)
        .function_name("prod.governance.mask_ssn")
        .to_principals(["analysts"])
        .match_columns("hasTagValue('pii', 'ssn')")
        .comment("Mask SSNs outside finance")
        .build()
        .unwrap()
}

fn audit_types(h: &Harness) -> Vec<AuditEventType> {
    h.audit.events().iter().map(|e| e.event_type).collect()
}

#[tokio::test]
async fn test_happy_path_create() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");

    let preview = h.gateway.preview(&request).await.unwrap();
    assert!(preview.description.contains("mask_ssn_finance"));
    assert_eq!(h.store.mutation_count(), 0);

    let policy = h
        .gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap();
    assert_eq!(policy.name(), "mask_ssn_finance");
    assert_eq!(policy.scope(), &finance());
    assert_eq!(policy.info.to_principals, vec!["analysts"]);

    let listed = h.gateway.list_policies(&finance(), false, None).await.unwrap();
    assert_eq!(listed.len(), 1);

    assert_eq!(
        audit_types(&h),
        vec![
            AuditEventType::PreviewIssued,
            AuditEventType::MutationExecuted,
            AuditEventType::PolicyRead,
        ]
    );
    let trail = h.gateway.audit().trail_for_token(&preview.token_ref).await.unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[1].caller.as_deref(), Some("alice@example.com"));
}

#[tokio::test]
async fn test_token_for_a_cannot_create_b() {
    let h = harness();
    let preview = h.gateway.preview(&create_mask("policy_a")).await.unwrap();

    let err = h
        .gateway
        .create_policy(&create_mask("policy_b"), Some(&preview.approval_token))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
    assert_eq!(h.store.mutation_count(), 0);
    let rejected = &h.audit.events()[1];
    assert_eq!(rejected.event_type, AuditEventType::TokenRejected);
    assert_eq!(rejected.reason.as_deref(), Some("PARAMETER_MISMATCH"));
}

#[tokio::test]
async fn test_changed_principals_invalidate_token() {
    let h = harness();
    let preview = h.gateway.preview(&create_mask("mask_ssn_finance")).await.unwrap();

    let widened = ChangeRequest::builder(Action::Create, "mask_ssn_finance", finance())
        .policy_type(PolicyType::ColumnMask)
        .function_name("prod.governance.mask_ssn")
        .to_principals(["analysts", "contractors"])
        .match_columns("hasTagValue('pii', 'ssn')")
        .comment("Mask SSNs outside finance")
        .build()
        .unwrap();

    let err = h
        .gateway
        .execute(&widened, Some(&preview.approval_token))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
}

#[tokio::test]
async fn test_stale_token_is_expired() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&request).await.unwrap();

    h.clock.set(T0 + 601);
    let err = h
        .gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
    assert_eq!(h.audit.events()[1].reason.as_deref(), Some("EXPIRED_TOKEN"));
}

#[tokio::test]
async fn test_token_valid_at_ttl_boundary() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&request).await.unwrap();

    h.clock.set(T0 + 600);
    h.gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_non_admin_with_valid_token_is_denied() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&request).await.unwrap();

    h.identity
        .set_caller(Caller::new("bob@example.com", ["analysts"]));
    let err = h
        .gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "PERMISSION_DENIED");
    assert_eq!(h.store.mutation_count(), 0);
    assert_eq!(
        audit_types(&h),
        vec![AuditEventType::PreviewIssued, AuditEventType::PermissionDenied]
    );
}

#[tokio::test]
async fn test_missing_token() {
    let h = harness();
    let err = h
        .gateway
        .create_policy(&create_mask("mask_ssn_finance"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), "MISSING_APPROVAL_TOKEN");
    assert_eq!(audit_types(&h), vec![AuditEventType::RequestRejected]);
    assert_eq!(
        h.audit.events()[0].reason.as_deref(),
        Some("MISSING_APPROVAL_TOKEN")
    );
}

#[tokio::test]
async fn test_tampered_token() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&request).await.unwrap();

    let mut tampered = preview.approval_token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let err = h
        .gateway
        .create_policy(&request, Some(&tampered))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
}

#[tokio::test]
async fn test_token_from_other_deployment_is_rejected() {
    let other = harness_with_secret("other-secret");
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = other.gateway.preview(&request).await.unwrap();

    let err = h
        .gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
    assert_eq!(h.audit.events()[0].reason.as_deref(), Some("INVALID_TOKEN"));
}

#[tokio::test]
async fn test_replayed_create_fails_as_duplicate() {
    let h = harness();
    let request = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&request).await.unwrap();

    h.gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap();
    let err = h
        .gateway
        .create_policy(&request, Some(&preview.approval_token))
        .await
        .unwrap_err();

    assert_eq!(err.code(), "ALREADY_EXISTS");
    assert!(matches!(
        err,
        warden_gateway::DispatchError::Store(PolicyStoreError::AlreadyExists { .. })
    ));
}

#[tokio::test]
async fn test_update_then_delete() {
    let h = harness();
    let create = create_mask("mask_ssn_finance");
    let preview = h.gateway.preview(&create).await.unwrap();
    h.gateway
        .create_policy(&create, Some(&preview.approval_token))
        .await
        .unwrap();

    let update = ChangeRequest::builder(Action::Update, "mask_ssn_finance", finance())
        .except_principals(["finance_admins"])
        .build()
        .unwrap();
    let preview = h.gateway.preview(&update).await.unwrap();
    assert_eq!(
        preview.statement,
        "ALTER POLICY mask_ssn_finance\nON SCHEMA prod.finance\nEXCEPT `finance_admins`;"
    );
    let updated = h
        .gateway
        .update_policy(&update, Some(&preview.approval_token))
        .await
        .unwrap();
    assert_eq!(updated.info.except_principals, vec!["finance_admins"]);
    assert_eq!(updated.info.comment.as_deref(), Some("Mask SSNs outside finance"));

    let delete = ChangeRequest::builder(Action::Delete, "mask_ssn_finance", finance())
        .build()
        .unwrap();
    let preview = h.gateway.preview(&delete).await.unwrap();
    h.gateway
        .delete_policy(&delete, Some(&preview.approval_token))
        .await
        .unwrap();

    let err = h
        .gateway
        .get_policy("mask_ssn_finance", &finance())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
}

#[tokio::test]
async fn test_delete_token_cannot_delete_other_scope() {
    let h = harness();
    let delete = ChangeRequest::builder(Action::Delete, "mask_ssn", finance())
        .build()
        .unwrap();
    let preview = h.gateway.preview(&delete).await.unwrap();

    let elsewhere = ChangeRequest::builder(Action::Delete, "mask_ssn", Scope::schema("prod.hr").unwrap())
        .build()
        .unwrap();
    let err = h
        .gateway
        .delete_policy(&elsewhere, Some(&preview.approval_token))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "INVALID_OR_EXPIRED_TOKEN");
}

#[tokio::test]
async fn test_reads_are_not_gated() {
    let h = harness();
    h.identity.clear();

    let listed = h.gateway.list_policies(&finance(), true, None).await.unwrap();
    assert!(listed.is_empty());
    assert_eq!(h.identity.lookups(), 0);
}

#[tokio::test]
async fn test_preview_is_side_effect_free() {
    let h = harness();
    for _ in 0..3 {
        h.gateway.preview(&create_mask("mask_ssn_finance")).await.unwrap();
    }
    assert_eq!(h.store.mutation_count(), 0);
    assert!(h.store.is_empty());
}

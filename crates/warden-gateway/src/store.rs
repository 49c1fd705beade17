//! The external policy store and an in-memory implementation of it.
//!
//! The gateway never implements policy semantics itself; it forwards approved
//! mutations to a [`PolicyStore`] and relays the result, including errors,
//! with their original classification.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;
use warden_core::{Policy, PolicyInfo, PolicyType, PolicyUpdate, Scope};

/// Errors reported by the policy store. Passed through to callers unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyStoreError {
    #[error("policy '{name}' not found on {scope}")]
    NotFound { name: String, scope: String },

    #[error("policy '{name}' already exists on {scope}")]
    AlreadyExists { name: String, scope: String },

    #[error("permission denied by policy store: {0}")]
    PermissionDenied(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("policy store unavailable: {0}")]
    Unavailable(String),

    #[error("quota exceeded: {0}")]
    QuotaExceeded(String),
}

impl PolicyStoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::QuotaExceeded(_) => "QUOTA_EXCEEDED",
        }
    }

    fn not_found(name: &str, scope: &Scope) -> Self {
        Self::NotFound {
            name: name.to_string(),
            scope: scope.to_string(),
        }
    }
}

/// Policy management operations the gateway consumes.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// List policies attached to `scope`, and to its enclosing scopes when
    /// `include_inherited` is set.
    async fn list(
        &self,
        scope: &Scope,
        include_inherited: bool,
        policy_type: Option<PolicyType>,
    ) -> Result<Vec<Policy>, PolicyStoreError>;

    async fn get(&self, name: &str, scope: &Scope) -> Result<Policy, PolicyStoreError>;

    async fn create(&self, info: PolicyInfo) -> Result<Policy, PolicyStoreError>;

    /// Replace the fields named in `field_mask` with the values in `update`.
    /// A masked field left unset in `update` is cleared.
    async fn update(
        &self,
        name: &str,
        scope: &Scope,
        update: PolicyUpdate,
        field_mask: &[String],
    ) -> Result<Policy, PolicyStoreError>;

    async fn delete(&self, name: &str, scope: &Scope) -> Result<(), PolicyStoreError>;
}

type PolicyKey = (String, String);

fn key(name: &str, scope: &Scope) -> PolicyKey {
    (scope.to_string(), name.to_string())
}

/// In-process policy store.
///
/// `create` fails on duplicates, so replaying a create is rejected here the
/// same way a real platform would reject it.
#[derive(Default)]
pub struct InMemoryPolicyStore {
    policies: RwLock<BTreeMap<PolicyKey, Policy>>,
    injected: Mutex<Option<PolicyStoreError>>,
    mutations: AtomicUsize,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next call fail with `error`.
    pub fn fail_next(&self, error: PolicyStoreError) {
        if let Ok(mut injected) = self.injected.lock() {
            *injected = Some(error);
        }
    }

    /// Number of create, update and delete calls received.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.policies.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn take_injected(&self) -> Result<(), PolicyStoreError> {
        let mut injected = self
            .injected
            .lock()
            .map_err(|e| PolicyStoreError::Unavailable(format!("lock poisoned: {}", e)))?;
        match injected.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn lock_error<E: std::fmt::Display>(e: E) -> PolicyStoreError {
        PolicyStoreError::Unavailable(format!("lock poisoned: {}", e))
    }
}

#[async_trait]
impl PolicyStore for InMemoryPolicyStore {
    async fn list(
        &self,
        scope: &Scope,
        include_inherited: bool,
        policy_type: Option<PolicyType>,
    ) -> Result<Vec<Policy>, PolicyStoreError> {
        self.take_injected()?;

        let mut scopes = vec![scope.clone()];
        if include_inherited {
            scopes.extend(scope.ancestors());
        }

        let policies = self.policies.read().map_err(Self::lock_error)?;
        let listed = scopes
            .iter()
            .flat_map(|s| {
                let scope_key = s.to_string();
                policies
                    .iter()
                    .filter(move |((k, _), _)| *k == scope_key)
                    .map(|(_, p)| p)
            })
            .filter(|p| policy_type.is_none_or(|t| p.info.policy_type == t))
            .cloned()
            .collect();
        Ok(listed)
    }

    async fn get(&self, name: &str, scope: &Scope) -> Result<Policy, PolicyStoreError> {
        self.take_injected()?;
        let policies = self.policies.read().map_err(Self::lock_error)?;
        policies
            .get(&key(name, scope))
            .cloned()
            .ok_or_else(|| PolicyStoreError::not_found(name, scope))
    }

    async fn create(&self, info: PolicyInfo) -> Result<Policy, PolicyStoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.take_injected()?;

        if info.to_principals.is_empty() {
            return Err(PolicyStoreError::BadRequest(
                "to_principals must not be empty".to_string(),
            ));
        }

        let mut policies = self.policies.write().map_err(Self::lock_error)?;
        let k = key(&info.name, &info.scope);
        if policies.contains_key(&k) {
            return Err(PolicyStoreError::AlreadyExists {
                name: info.name,
                scope: info.scope.to_string(),
            });
        }

        let now = Utc::now();
        let policy = Policy {
            id: Uuid::new_v4().to_string(),
            info,
            created_at: now,
            updated_at: now,
        };
        tracing::debug!(name = %policy.name(), scope = %policy.scope(), "Stored policy");
        policies.insert(k, policy.clone());
        Ok(policy)
    }

    async fn update(
        &self,
        name: &str,
        scope: &Scope,
        update: PolicyUpdate,
        field_mask: &[String],
    ) -> Result<Policy, PolicyStoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.take_injected()?;

        if field_mask.is_empty() {
            return Err(PolicyStoreError::BadRequest("field mask is empty".to_string()));
        }

        let mut policies = self.policies.write().map_err(Self::lock_error)?;
        let policy = policies
            .get_mut(&key(name, scope))
            .ok_or_else(|| PolicyStoreError::not_found(name, scope))?;

        let mut next = policy.info.clone();
        for field in field_mask {
            match field.as_str() {
                "to_principals" => {
                    let principals = update.to_principals.clone().unwrap_or_default();
                    if principals.is_empty() {
                        return Err(PolicyStoreError::BadRequest(
                            "to_principals must not be empty".to_string(),
                        ));
                    }
                    next.to_principals = principals;
                }
                "except_principals" => {
                    next.except_principals = update.except_principals.clone().unwrap_or_default();
                }
                "comment" => next.comment = update.comment.clone(),
                other => {
                    return Err(PolicyStoreError::BadRequest(format!(
                        "field '{}' cannot be updated",
                        other
                    )));
                }
            }
        }

        policy.info = next;
        policy.updated_at = Utc::now();
        Ok(policy.clone())
    }

    async fn delete(&self, name: &str, scope: &Scope) -> Result<(), PolicyStoreError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        self.take_injected()?;

        let mut policies = self.policies.write().map_err(Self::lock_error)?;
        policies
            .remove(&key(name, scope))
            .map(|_| ())
            .ok_or_else(|| PolicyStoreError::not_found(name, scope))
    }
}

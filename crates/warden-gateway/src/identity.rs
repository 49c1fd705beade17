//! Caller identity resolution.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use thiserror::Error;
use warden_core::Caller;

/// Errors from the identity collaborator.
#[derive(Debug, Clone, Error)]
pub enum IdentityError {
    #[error("no authenticated caller")]
    Unauthenticated,

    #[error("identity service unavailable: {0}")]
    Unavailable(String),
}

/// Resolves who is making the current call and which groups they belong to.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn current_caller(&self) -> Result<Caller, IdentityError>;
}

/// Identity provider returning a fixed caller, which can be swapped at runtime.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    caller: RwLock<Option<Caller>>,
    lookups: AtomicUsize,
}

impl StaticIdentityProvider {
    pub fn new(caller: Caller) -> Self {
        Self {
            caller: RwLock::new(Some(caller)),
            lookups: AtomicUsize::new(0),
        }
    }

    /// A provider with nobody signed in.
    pub fn unauthenticated() -> Self {
        Self::default()
    }

    pub fn set_caller(&self, caller: Caller) {
        if let Ok(mut current) = self.caller.write() {
            *current = Some(caller);
        }
    }

    pub fn clear(&self) {
        if let Ok(mut current) = self.caller.write() {
            *current = None;
        }
    }

    /// How many times `current_caller` has been called.
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn current_caller(&self) -> Result<Caller, IdentityError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let current = self
            .caller
            .read()
            .map_err(|e| IdentityError::Unavailable(format!("lock poisoned: {}", e)))?;
        current.clone().ok_or(IdentityError::Unauthenticated)
    }
}

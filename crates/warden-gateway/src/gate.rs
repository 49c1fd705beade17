//! Authorization gate: may this caller mutate policies at all?

use crate::error::GateError;
use crate::identity::IdentityProvider;
use std::sync::Arc;
use warden_core::Caller;

/// Admin-group check run before any token validation.
///
/// Memberships are looked up on every call and never cached.
#[derive(Clone)]
pub struct AuthorizationGate {
    identity: Arc<dyn IdentityProvider>,
    admin_group: String,
}

impl AuthorizationGate {
    pub fn new(identity: Arc<dyn IdentityProvider>, admin_group: impl Into<String>) -> Self {
        Self {
            identity,
            admin_group: admin_group.into(),
        }
    }

    pub fn admin_group(&self) -> &str {
        &self.admin_group
    }

    /// Resolve the current caller and decide.
    ///
    /// Returns the caller when allowed so the rest of the call can attribute
    /// its audit events.
    pub async fn check(&self) -> Result<Caller, GateError> {
        let caller = self.identity.current_caller().await?;
        self.decide(&caller)?;
        Ok(caller)
    }

    /// Pure decision for an already resolved caller.
    pub fn decide(&self, caller: &Caller) -> Result<(), GateError> {
        if caller.is_member_of(&self.admin_group) {
            Ok(())
        } else {
            Err(GateError::Denied {
                identity: caller.identity.clone(),
            })
        }
    }
}

impl std::fmt::Debug for AuthorizationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationGate")
            .field("admin_group", &self.admin_group)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{IdentityError, StaticIdentityProvider};

    #[tokio::test]
    async fn test_admin_allowed() {
        let identity = Arc::new(StaticIdentityProvider::new(Caller::new(
            "alice@example.com",
            ["admins", "analysts"],
        )));
        let gate = AuthorizationGate::new(identity, "admins");
        assert_eq!(gate.check().await.unwrap().identity, "alice@example.com");
    }

    #[tokio::test]
    async fn test_non_admin_denied() {
        let identity = Arc::new(StaticIdentityProvider::new(Caller::new(
            "bob@example.com",
            ["analysts", "Admins"],
        )));
        let gate = AuthorizationGate::new(identity, "admins");
        assert!(matches!(gate.check().await, Err(GateError::Denied { .. })));
    }

    #[tokio::test]
    async fn test_membership_is_looked_up_every_time() {
        let identity = Arc::new(StaticIdentityProvider::new(Caller::new("alice", ["admins"])));
        let gate = AuthorizationGate::new(identity.clone(), "admins");

        gate.check().await.unwrap();
        identity.set_caller(Caller::new("alice", ["analysts"]));
        assert!(gate.check().await.is_err());
        assert_eq!(identity.lookups(), 2);
    }

    #[tokio::test]
    async fn test_unresolvable_identity_fails_closed() {
        let gate = AuthorizationGate::new(Arc::new(StaticIdentityProvider::unauthenticated()), "admins");
        assert!(matches!(
            gate.check().await,
            Err(GateError::IdentityUnavailable(IdentityError::Unauthenticated))
        ));
    }
}

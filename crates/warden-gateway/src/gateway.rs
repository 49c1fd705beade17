//! The assembled gateway: preview, gated mutations and exempt reads.

use crate::dispatcher::{MutationDispatcher, MutationOutcome};
use crate::error::{DispatchError, GatewayError, PreviewError};
use crate::gate::AuthorizationGate;
use crate::identity::IdentityProvider;
use crate::preview::{Preview, PreviewService};
use crate::store::{PolicyStore, PolicyStoreError};
use std::sync::Arc;
use warden_audit::AuditLogger;
use warden_core::{Action, ChangeRequest, Policy, PolicyType, Scope, WardenConfig};
use warden_token::{Clock, SigningSecret, SystemClock, TokenCodec};

/// Entry point wiring the preview service, authorization gate and mutation
/// dispatcher around one signing secret, one admin group and one audit sink.
pub struct Gateway {
    preview: PreviewService,
    dispatcher: MutationDispatcher,
    store: Arc<dyn PolicyStore>,
    audit: Arc<AuditLogger>,
    admin_group: String,
    ttl_seconds: u64,
}

impl Gateway {
    /// Build a gateway from configuration. The secret and admin group are
    /// resolved here, once.
    pub fn new(
        config: &WardenConfig,
        store: Arc<dyn PolicyStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self, GatewayError> {
        GatewayBuilder::new(config.clone(), store, identity).build()
    }

    pub fn builder(
        config: WardenConfig,
        store: Arc<dyn PolicyStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> GatewayBuilder {
        GatewayBuilder::new(config, store, identity)
    }

    pub fn admin_group(&self) -> &str {
        &self.admin_group
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// Render a change and issue an approval token. No side effects on the
    /// policy store.
    pub async fn preview(&self, request: &ChangeRequest) -> Result<Preview, PreviewError> {
        self.preview.preview(request).await
    }

    /// Execute a previously previewed change.
    pub async fn execute(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<MutationOutcome, DispatchError> {
        self.dispatcher.dispatch(request, approval_token).await
    }

    pub async fn create_policy(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<Policy, DispatchError> {
        match self
            .dispatcher
            .dispatch_expecting(Action::Create, request, approval_token)
            .await?
        {
            MutationOutcome::Created(policy) => Ok(policy),
            other => Err(unexpected_outcome(&other)),
        }
    }

    pub async fn update_policy(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<Policy, DispatchError> {
        match self
            .dispatcher
            .dispatch_expecting(Action::Update, request, approval_token)
            .await?
        {
            MutationOutcome::Updated(policy) => Ok(policy),
            other => Err(unexpected_outcome(&other)),
        }
    }

    pub async fn delete_policy(
        &self,
        request: &ChangeRequest,
        approval_token: Option<&str>,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch_expecting(Action::Delete, request, approval_token)
            .await
            .map(|_| ())
    }

    /// List policies. Read-only, so not gated.
    pub async fn list_policies(
        &self,
        scope: &Scope,
        include_inherited: bool,
        policy_type: Option<PolicyType>,
    ) -> Result<Vec<Policy>, PolicyStoreError> {
        self.audit
            .log_policy_read("LIST", None, &scope.to_string())
            .await;
        self.store.list(scope, include_inherited, policy_type).await
    }

    /// Fetch one policy. Read-only, so not gated.
    pub async fn get_policy(&self, name: &str, scope: &Scope) -> Result<Policy, PolicyStoreError> {
        self.audit
            .log_policy_read("GET", Some(name), &scope.to_string())
            .await;
        self.store.get(name, scope).await
    }
}

fn unexpected_outcome(outcome: &MutationOutcome) -> DispatchError {
    DispatchError::InvalidRequest(format!("unexpected outcome: {:?}", outcome))
}

/// Builder for [`Gateway`], for overriding the secret, clock or audit sink.
pub struct GatewayBuilder {
    config: WardenConfig,
    store: Arc<dyn PolicyStore>,
    identity: Arc<dyn IdentityProvider>,
    secret: Option<SigningSecret>,
    clock: Arc<dyn Clock>,
    audit: Option<Arc<AuditLogger>>,
}

impl GatewayBuilder {
    pub fn new(
        config: WardenConfig,
        store: Arc<dyn PolicyStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            config,
            store,
            identity,
            secret: None,
            clock: Arc::new(SystemClock),
            audit: None,
        }
    }

    /// Use this secret instead of resolving one from configuration.
    pub fn secret(mut self, secret: SigningSecret) -> Self {
        self.secret = Some(secret);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn audit_logger(mut self, audit: Arc<AuditLogger>) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn build(self) -> Result<Gateway, GatewayError> {
        self.config
            .validate()
            .map_err(|e| GatewayError::Config(e.to_string()))?;

        let secret = match self.secret {
            Some(secret) => secret,
            None => resolve_secret(&self.config)?,
        };
        let ttl_seconds = self.config.approval.token_ttl_seconds;
        let codec = TokenCodec::new(secret, ttl_seconds).with_clock(self.clock);

        let admin_group = self.config.authorization.resolve_admin_group();
        let audit = match self.audit {
            Some(audit) => audit,
            None => Arc::new(AuditLogger::new(&self.config.audit)?),
        };

        tracing::info!(
            admin_group = %admin_group,
            ttl_seconds,
            audit_enabled = audit.is_enabled(),
            "Gateway initialized"
        );

        let gate = AuthorizationGate::new(self.identity, admin_group.clone());
        Ok(Gateway {
            preview: PreviewService::new(codec.clone(), audit.clone()),
            dispatcher: MutationDispatcher::new(gate, codec, self.store.clone(), audit.clone()),
            store: self.store,
            audit,
            admin_group,
            ttl_seconds,
        })
    }
}

/// Resolve the signing secret from configuration, falling back to the
/// development placeholder.
pub fn resolve_secret(config: &WardenConfig) -> Result<SigningSecret, GatewayError> {
    let resolved = config
        .approval
        .resolve_secret()
        .map_err(|e| GatewayError::Secret(e.into()))?;

    match resolved {
        Some(text) => Ok(SigningSecret::from_text(&text)?),
        None => {
            tracing::warn!(
                secret_env = %config.approval.secret_env,
                "No approval secret configured; using the insecure development placeholder"
            );
            Ok(SigningSecret::placeholder())
        }
    }
}

//! # warden-core
//!
//! Domain types and configuration shared across the Warden crates.
//!
//! - [`ChangeRequest`]: a proposed CREATE, UPDATE or DELETE of a policy
//! - [`Scope`]: the catalog, schema or table a policy is attached to
//! - [`PolicyInfo`], [`Policy`], [`PolicyUpdate`]: what the external policy store accepts and returns
//! - [`Caller`]: the identity and group memberships behind a call
//! - [`config::WardenConfig`]: secret source, token TTL, admin group, audit sink

pub mod caller;
pub mod config;
pub mod error;
pub mod policy;
pub mod request;
pub mod scope;

pub use caller::Caller;
pub use config::{
    ApprovalConfig, AuditConfig, AuthorizationConfig, ConfigError, StorageBackend, WardenConfig,
    MAX_TOKEN_TTL_SECONDS,
};
pub use error::ModelError;
pub use policy::{Policy, PolicyInfo, PolicyType, PolicyUpdate};
pub use request::{params, Action, ChangeRequest, ChangeRequestBuilder, RESERVED_PARAMETERS};
pub use scope::{validate_identifier, Scope, SecurableType};

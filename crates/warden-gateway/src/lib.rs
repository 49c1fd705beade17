//! # warden-gateway
//!
//! Approval-token guarded policy mutations.
//!
//! A change goes through two calls:
//!
//! 1. [`Gateway::preview`] validates the request's shape, renders the
//!    equivalent statement, and issues an approval token bound to the exact
//!    request. Nothing is changed.
//! 2. After a human approves the rendered statement out of band,
//!    [`Gateway::execute`] runs the [`AuthorizationGate`], verifies the token
//!    against the current request, and forwards to the [`PolicyStore`].
//!
//! | Caller-visible code | When |
//! |---------------------|------|
//! | `PERMISSION_DENIED` | Caller is not in the admin group (checked first) |
//! | `IDENTITY_UNAVAILABLE` | Caller could not be resolved |
//! | `MISSING_APPROVAL_TOKEN` | No token supplied |
//! | `INVALID_OR_EXPIRED_TOKEN` | Malformed, forged, expired or mismatched token |
//! | `INVALID_REQUEST` | Request shape is wrong for its action |
//! | store codes | Passed through from the policy store |
//!
//! Tokens are not consumed: a valid token may be redeemed again within its
//! TTL. A duplicate create is then rejected by the store.

pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod gateway;
pub mod identity;
pub mod preview;
pub mod render;
pub mod shape;
pub mod store;

pub use dispatcher::{MutationDispatcher, MutationOutcome};
pub use error::{DispatchError, GateError, GatewayError, PreviewError};
pub use gate::AuthorizationGate;
pub use gateway::{resolve_secret, Gateway, GatewayBuilder};
pub use identity::{IdentityError, IdentityProvider, StaticIdentityProvider};
pub use preview::{Preview, PreviewService};
pub use render::{describe, render_statement};
pub use shape::{MutationPlan, ShapeError};
pub use store::{InMemoryPolicyStore, PolicyStore, PolicyStoreError};

//! # warden-audit
//!
//! Audit logging for the Warden mutation gateway.
//!
//! Every decision the gateway makes is recorded as an [`AuditEvent`]:
//!
//! | Event Type | Description |
//! |------------|-------------|
//! | `PreviewIssued` | Change rendered, approval token issued |
//! | `PermissionDenied` | Caller not in the admin group |
//! | `TokenRejected` | Token failed verification (internal reason recorded) |
//! | `RequestRejected` | Missing token, wrong action or malformed request |
//! | `MutationExecuted` | Policy store accepted the mutation |
//! | `MutationFailed` | Policy store rejected or failed the mutation |
//! | `PolicyRead` | Read-only list/get |
//!
//! The token reference (signature prefix) ties a preview to the execution
//! that redeemed it.

pub mod error;
pub mod event;
pub mod logger;
pub mod storage;

pub use error::AuditError;
pub use event::{AuditEvent, AuditEventBuilder, AuditEventType};
pub use logger::{AuditFilter, AuditLogger};
pub use storage::{
    create_storage, AuditStorage, ConsoleStorage, FileStorage, MemoryStorage, NullStorage,
};

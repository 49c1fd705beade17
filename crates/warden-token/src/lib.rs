//! # warden-token
//!
//! Approval tokens for the preview / approve / execute protocol.
//!
//! An approval token is a signed receipt for one exact set of change
//! parameters. It is issued when a change is previewed and must be presented,
//! unchanged and within its TTL, when the change is executed.
//!
//! ```text
//! <hex HMAC-SHA256 over payload>:<base64(canonical JSON payload)>
//! ```
//!
//! | Failure | Cause |
//! |---------|-------|
//! | `MALFORMED_TOKEN` | no separator, bad base64, payload not a JSON object, bad timestamp |
//! | `INVALID_TOKEN` | signature mismatch (forged, tampered, or wrong secret) |
//! | `EXPIRED_TOKEN` | issued more than `ttl` seconds before or after now |
//! | `PARAMETER_MISMATCH` | payload parameters differ from the current call |
//!
//! Tokens are not recorded when redeemed, so a token can be replayed against
//! identical parameters until it expires.

pub mod canonical;
pub mod clock;
pub mod codec;
pub mod error;
pub mod inspect;
pub mod secret;

pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{TokenCodec, TokenParams, TIMESTAMP_FIELD};
pub use error::{TokenError, TokenFailure};
pub use inspect::{inspect_unverified, token_reference, TokenInfo};
pub use secret::{SigningSecret, DEV_PLACEHOLDER_SECRET};

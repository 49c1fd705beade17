//! Approval token issuance and verification.
//!
//! Wire format: `<lowercase hex HMAC-SHA256>:<base64 of canonical JSON>`.
//! The JSON payload is the bound parameter mapping plus an integer
//! `timestamp` (seconds since the epoch) set at issuance.

use crate::canonical::to_canonical_string;
use crate::clock::{Clock, SystemClock};
use crate::error::TokenError;
use crate::secret::SigningSecret;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{Map, Value};
use sha2::Sha256;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Parameter mapping a token is bound to.
pub type TokenParams = BTreeMap<String, Value>;

/// Payload key holding the issuance time.
pub const TIMESTAMP_FIELD: &str = "timestamp";

/// Issues and verifies approval tokens under one secret and TTL.
#[derive(Debug, Clone)]
pub struct TokenCodec {
    secret: SigningSecret,
    ttl_seconds: u64,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec reading the wall clock.
    pub fn new(secret: SigningSecret, ttl_seconds: u64) -> Self {
        Self {
            secret,
            ttl_seconds,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replace the time source.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn ttl_seconds(&self) -> u64 {
        self.ttl_seconds
    }

    pub fn now_unix(&self) -> i64 {
        self.clock.now_unix()
    }

    /// Issue a token bound to `params` and the current time.
    ///
    /// Keys whose value is null are dropped before signing.
    pub fn encode(&self, params: &TokenParams) -> Result<String, TokenError> {
        self.encode_at(params, self.clock.now_unix())
    }

    /// Issue a token stamped with `issued_at` (seconds since the epoch).
    ///
    /// Lets callers that also report the issuance time read the clock once.
    pub fn encode_at(&self, params: &TokenParams, issued_at: i64) -> Result<String, TokenError> {
        if params.contains_key(TIMESTAMP_FIELD) {
            return Err(TokenError::ReservedField(TIMESTAMP_FIELD.to_string()));
        }

        let mut payload: Map<String, Value> = without_nulls(params).into_iter().collect();
        payload.insert(TIMESTAMP_FIELD.to_string(), Value::from(issued_at));

        let canonical = to_canonical_string(&Value::Object(payload))?;
        let signature = hex::encode(self.sign(canonical.as_bytes())?);

        tracing::debug!(
            signature_prefix = %&signature[..16],
            fields = params.len(),
            "Issued approval token"
        );

        Ok(format!("{}:{}", signature, STANDARD.encode(canonical.as_bytes())))
    }

    /// Verify `token` against the parameters of the current call.
    ///
    /// Checks, in order: structure, signature (constant time), timestamp,
    /// TTL window (inclusive boundary), then exact parameter equality.
    pub fn verify(&self, token: &str, expected: &TokenParams) -> Result<(), TokenError> {
        let (signature, encoded) = token
            .split_once(':')
            .ok_or_else(|| TokenError::Malformed("missing ':' separator".to_string()))?;

        let payload_bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| TokenError::Malformed(format!("payload is not base64: {}", e)))?;

        let computed = hex::encode(self.sign(&payload_bytes)?);
        if !bool::from(computed.as_bytes().ct_eq(signature.as_bytes())) {
            return Err(TokenError::InvalidSignature);
        }

        let mut payload = match serde_json::from_slice::<Value>(&payload_bytes) {
            Ok(Value::Object(map)) => map,
            Ok(_) => return Err(TokenError::Malformed("payload is not an object".to_string())),
            Err(e) => return Err(TokenError::Malformed(format!("payload is not JSON: {}", e))),
        };

        let issued_at = payload
            .remove(TIMESTAMP_FIELD)
            .and_then(|v| v.as_i64())
            .ok_or_else(|| TokenError::Malformed("missing or non-integer timestamp".to_string()))?;

        let now = self.clock.now_unix();
        if now.abs_diff(issued_at) > self.ttl_seconds {
            return Err(TokenError::Expired {
                issued_at,
                now,
                ttl_seconds: self.ttl_seconds,
            });
        }

        let bound: TokenParams = payload.into_iter().collect();
        let expected = without_nulls(expected);
        if let Some(field) = first_mismatch(&bound, &expected) {
            return Err(TokenError::ParameterMismatch { field });
        }

        Ok(())
    }

    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, TokenError> {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .map_err(|e| TokenError::InvalidSecret(e.to_string()))?;
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

fn without_nulls(params: &TokenParams) -> TokenParams {
    params
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// First key (in sorted order) that is missing on either side or differs.
fn first_mismatch(bound: &TokenParams, expected: &TokenParams) -> Option<String> {
    let keys: BTreeSet<&String> = bound.keys().chain(expected.keys()).collect();
    keys.into_iter()
        .find(|k| bound.get(*k) != expected.get(*k))
        .cloned()
}

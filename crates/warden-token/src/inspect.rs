//! Unverified token inspection, for operators debugging a rejected token.

use crate::codec::{TokenParams, TIMESTAMP_FIELD};
use crate::error::TokenError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Decoded contents of a token. Nothing here has been authenticated.
#[derive(Debug, Clone)]
pub struct TokenInfo {
    /// Hex signature as supplied.
    pub signature: String,
    /// Issuance time, if the payload carries a valid one.
    pub issued_at: Option<DateTime<Utc>>,
    /// Bound parameters, without the timestamp.
    pub params: TokenParams,
}

/// Decode a token without checking its signature.
pub fn inspect_unverified(token: &str) -> Result<TokenInfo, TokenError> {
    let (signature, encoded) = token
        .split_once(':')
        .ok_or_else(|| TokenError::Malformed("missing ':' separator".to_string()))?;

    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TokenError::Malformed(format!("payload is not base64: {}", e)))?;

    let mut params: TokenParams = match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        Ok(_) => return Err(TokenError::Malformed("payload is not an object".to_string())),
        Err(e) => return Err(TokenError::Malformed(format!("payload is not JSON: {}", e))),
    };

    let issued_at = params
        .remove(TIMESTAMP_FIELD)
        .and_then(|v| v.as_i64())
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    Ok(TokenInfo {
        signature: signature.to_string(),
        issued_at,
        params,
    })
}

/// Short, non-secret handle for a token, safe to put in logs and audit events.
pub fn token_reference(token: &str) -> String {
    let signature = token.split(':').next().unwrap_or_default();
    signature.chars().take(16).collect()
}

//! Canonical JSON serialization.
//!
//! Object keys are sorted by byte order at every depth and no whitespace is
//! emitted, so the same logical mapping always serializes to the same bytes
//! regardless of how `serde_json::Map` orders its entries.

use crate::error::TokenError;
use serde_json::Value;

/// Deepest nesting of objects and arrays a payload may have, counting the
/// payload object itself. Kept well below `serde_json`'s parse limit so every
/// issued token can be parsed back.
pub const MAX_DEPTH: usize = 64;

/// Serialize `value` canonically.
pub fn to_canonical_string(value: &Value) -> Result<String, TokenError> {
    let mut out = String::new();
    write_value(value, 0, &mut out)?;
    Ok(out)
}

fn write_value(value: &Value, depth: usize, out: &mut String) -> Result<(), TokenError> {
    if matches!(value, Value::Object(_) | Value::Array(_)) && depth >= MAX_DEPTH {
        return Err(TokenError::NestingTooDeep { limit: MAX_DEPTH });
    }

    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_value(&map[key], depth + 1, out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(item, depth + 1, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

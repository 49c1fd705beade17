//! Approval token commands.
//!
//! `warden token inspect` - Decode a token without verification.
//! `warden token verify` - Verify a token against a change request.

use super::{load_config, load_request, read_token};
use std::path::Path;
use warden_gateway::resolve_secret;
use warden_token::{inspect_unverified, TokenCodec};

/// Decode a token's payload without checking the signature.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = read_token(token)?;
    let info = inspect_unverified(&token)?;

    println!("Token Information (unverified):");
    println!("  Signature: {}", info.signature);
    match info.issued_at {
        Some(issued_at) => println!("  Issued at: {}", issued_at.to_rfc3339()),
        None => println!("  Issued at: (missing)"),
    }
    println!("  Parameters:");
    for (key, value) in &info.params {
        println!("    {}: {}", key, value);
    }

    Ok(())
}

/// Verify a token against a change request using the configured secret and TTL.
///
/// Unlike the gateway, this reports the specific failure. It is an operator
/// tool and requires the signing secret.
pub fn verify(config_path: Option<&Path>, token: String, request_path: &Path) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let request = load_request(request_path)?;
    let token = read_token(token)?;

    let codec = TokenCodec::new(resolve_secret(&config)?, config.approval.token_ttl_seconds);
    match codec.verify(&token, &request.token_params()) {
        Ok(()) => {
            println!("✔ valid");
            Ok(())
        }
        Err(e) => {
            let code = e.failure().map(|f| f.code()).unwrap_or("TOKEN_ERROR");
            println!("✖ {}: {}", code, e);
            std::process::exit(1);
        }
    }
}

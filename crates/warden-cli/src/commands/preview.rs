//! `warden preview` - render a change request and issue its approval token.

use super::{load_config, load_request};
use std::path::Path;
use std::sync::Arc;
use warden_gateway::{Gateway, InMemoryPolicyStore, StaticIdentityProvider};

pub async fn run(config_path: Option<&Path>, request_path: &Path, json: bool) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let request = load_request(request_path)?;

    // Previewing never reaches the store or the identity provider
    let gateway = Gateway::new(
        &config,
        Arc::new(InMemoryPolicyStore::new()),
        Arc::new(StaticIdentityProvider::unauthenticated()),
    )?;
    let preview = gateway.preview(&request).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&preview)?);
        return Ok(());
    }

    println!("{}", preview.description);
    println!();
    println!("{}", preview.statement);
    println!();
    println!("Approval token (expires {}):", preview.expires_at.to_rfc3339());
    println!("{}", preview.approval_token);

    Ok(())
}

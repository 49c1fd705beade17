//! Signing secret management.
//!
//! `warden keys generate` - Generate a new approval signing secret.

use std::fs;
use std::path::PathBuf;
use warden_token::SigningSecret;

/// Generate a new signing secret.
pub fn generate(output: Option<PathBuf>) -> anyhow::Result<()> {
    let secret = SigningSecret::generate().to_hex();

    if let Some(path) = output {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, &secret)?;

        println!("✔ Generated approval signing secret: {}", path.display());
        println!();
        println!("⚠️  Anyone holding this secret can mint approval tokens. Never commit it.");
        println!();
        println!("Point the gateway at it with approval.secret_file, or:");
        println!("  export WARDEN_APPROVAL_SECRET=$(cat {})", path.display());
    } else {
        println!("{}", secret);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_secret_to_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keys").join("approval.secret");
        generate(Some(path.clone())).unwrap();

        let secret = fs::read_to_string(&path).unwrap();
        // 32 random bytes, hex encoded
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_hexdigit()));
    }
}

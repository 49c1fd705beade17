//! Signing secret management.

use crate::error::TokenError;
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// Insecure secret used when no secret is configured. Only for local development.
pub const DEV_PLACEHOLDER_SECRET: &str = "warden-insecure-dev-secret-change-me";

/// Shared secret keying the approval token MAC.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret {
    bytes: Vec<u8>,
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

impl SigningSecret {
    /// Use raw bytes as the secret.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(TokenError::InvalidSecret("secret cannot be empty".to_string()));
        }
        Ok(Self { bytes })
    }

    /// Use the UTF-8 bytes of a configured string as the secret.
    pub fn from_text(text: &str) -> Result<Self, TokenError> {
        Self::from_bytes(text.as_bytes())
    }

    /// Decode a hex-encoded secret.
    pub fn from_hex(hex_str: &str) -> Result<Self, TokenError> {
        let bytes =
            hex::decode(hex_str.trim()).map_err(|e| TokenError::InvalidSecret(e.to_string()))?;
        Self::from_bytes(bytes)
    }

    /// Generate 32 random bytes.
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self {
            bytes: bytes.to_vec(),
        }
    }

    /// The development placeholder.
    pub fn placeholder() -> Self {
        Self {
            bytes: DEV_PLACEHOLDER_SECRET.as_bytes().to_vec(),
        }
    }

    /// Whether this secret is the development placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.bytes == DEV_PLACEHOLDER_SECRET.as_bytes()
    }

    /// Load a secret from a file, used as text after trimming whitespace.
    pub fn load_from_file(path: &Path) -> Result<Self, TokenError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_text(text.trim())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_generate_is_random() {
        let a = SigningSecret::generate();
        let b = SigningSecret::generate();
        assert_eq!(a.as_bytes().len(), 32);
        assert_ne!(a, b);
        assert!(!a.is_placeholder());
    }

    #[test]
    fn test_hex_roundtrip() {
        let secret = SigningSecret::generate();
        let decoded = SigningSecret::from_hex(&secret.to_hex()).unwrap();
        assert_eq!(secret, decoded);
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            SigningSecret::from_text(""),
            Err(TokenError::InvalidSecret(_))
        ));
        assert!(SigningSecret::from_hex("zz").is_err());
    }

    #[test]
    fn test_debug_is_redacted() {
        let secret = SigningSecret::from_text("hunter2").unwrap();
        assert!(!format!("{:?}", secret).contains("hunter2"));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(SigningSecret::placeholder().is_placeholder());
        assert!(SigningSecret::from_text(DEV_PLACEHOLDER_SECRET).unwrap().is_placeholder());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "file-secret").unwrap();
        let secret = SigningSecret::load_from_file(file.path()).unwrap();
        assert_eq!(secret.as_bytes(), b"file-secret");
    }
}

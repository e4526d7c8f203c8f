//! Password hashing.
//!
//! Stored credentials are Argon2id PHC strings. Verification never errors: a
//! hash that cannot be parsed simply does not match.
use anyhow::anyhow;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};

/// One-way credential hashing as seen by the account engine.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, raw: &str) -> anyhow::Result<String>;
    fn verify(&self, raw: &str, hash: &str) -> bool;
}

/// Argon2id with the crate's default parameters and a random 16-byte salt.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, raw: &str) -> anyhow::Result<String> {
        let mut salt_bytes = [0u8; 16];
        getrandom::getrandom(&mut salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
        let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!(e.to_string()))?;
        let phc = Argon2::default()
            .hash_password(raw.as_bytes(), &salt)
            .map_err(|e| anyhow!(e.to_string()))?
            .to_string();
        Ok(phc)
    }

    fn verify(&self, raw: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(raw.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hasher = Argon2Hasher;
        let phc = hasher.hash("bobPw").expect("hash");
        assert!(phc.starts_with("$argon2id$"));
        assert!(hasher.verify("bobPw", &phc));
        assert!(!hasher.verify("bobpw", &phc));
    }

    #[test]
    fn salts_differ_per_hash() {
        let hasher = Argon2Hasher;
        let a = hasher.hash("same").expect("a");
        let b = hasher.hash("same").expect("b");
        assert_ne!(a, b);
        assert!(hasher.verify("same", &a));
        assert!(hasher.verify("same", &b));
    }

    #[test]
    fn unparsable_hash_never_verifies() {
        let hasher = Argon2Hasher;
        assert!(!hasher.verify("bobPw", "not-a-phc-string"));
        assert!(!hasher.verify("", ""));
    }
}

//! Password hashing
//!
//! PBKDF2-HMAC-SHA256 via openssl. Stored format:
//! `pbkdf2-sha256$<iterations>$<salt b64>$<hash b64>`.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use openssl::hash::MessageDigest;
use openssl::memcmp;
use openssl::pkcs5::pbkdf2_hmac;
use openssl::rand::rand_bytes;

use crate::error::{AppError, Result};

const SCHEME: &str = "pbkdf2-sha256";
const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    iterations: u32,
}

impl PasswordHasher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn hash(&self, password: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        rand_bytes(&mut salt).map_err(|e| AppError::Internal(format!("rand: {}", e)))?;

        let hash = derive(password, &salt, self.iterations)?;

        Ok(format!(
            "{}${}${}${}",
            SCHEME,
            self.iterations,
            STANDARD.encode(salt),
            STANDARD.encode(hash)
        ))
    }

    /// Malformed stored hashes verify as false
    pub fn verify(&self, password: &str, encoded: &str) -> Result<bool> {
        let mut parts = encoded.split('$');
        let (Some(SCHEME), Some(iterations), Some(salt), Some(expected), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Ok(false);
        };

        let Ok(iterations) = iterations.parse::<u32>() else {
            return Ok(false);
        };
        let (Ok(salt), Ok(expected)) = (STANDARD.decode(salt), STANDARD.decode(expected)) else {
            return Ok(false);
        };

        let actual = derive(password, &salt, iterations)?;
        Ok(actual.len() == expected.len() && memcmp::eq(&actual, &expected))
    }
}

fn derive(password: &str, salt: &[u8], iterations: u32) -> Result<Vec<u8>> {
    let mut out = vec![0u8; HASH_LEN];
    pbkdf2_hmac(
        password.as_bytes(),
        salt,
        iterations as usize,
        MessageDigest::sha256(),
        &mut out,
    )
    .map_err(|e| AppError::Internal(format!("pbkdf2: {}", e)))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new(1_000);
        let encoded = hasher.hash("char-is-red-1").unwrap();

        assert!(encoded.starts_with("pbkdf2-sha256$1000$"));
        assert!(hasher.verify("char-is-red-1", &encoded).unwrap());
        assert!(!hasher.verify("char-is-red-2", &encoded).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let hasher = PasswordHasher::new(1_000);
        assert_ne!(hasher.hash("same").unwrap(), hasher.hash("same").unwrap());
    }

    #[test]
    fn test_verify_uses_stored_iterations() {
        let encoded = PasswordHasher::new(500).hash("newtype1").unwrap();
        assert!(PasswordHasher::new(2_000).verify("newtype1", &encoded).unwrap());
    }

    #[test]
    fn test_malformed_hash_is_rejected() {
        let hasher = PasswordHasher::new(1_000);
        assert!(!hasher.verify("x", "plaintext").unwrap());
        assert!(!hasher.verify("x", "bcrypt$10$abc$def").unwrap());
        assert!(!hasher.verify("x", "pbkdf2-sha256$NaN$abc$def").unwrap());
    }
}

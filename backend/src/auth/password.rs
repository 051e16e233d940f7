//! Credential hashing and verification using argon2
//!
//! Secrets are stored as Argon2id PHC strings; the salt and parameters travel
//! inside the stored hash, so verification needs nothing else.
//!
//! Argon2 is CPU-intensive. Request handlers should use the `_async`
//! variants, which run on the blocking thread pool.

use anyhow::Result;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use tracing::warn;

/// Hashes secrets on registration and checks them on login
pub struct CredentialVerifier;

impl CredentialVerifier {
    /// Hash a secret with a fresh random salt (blocking)
    pub fn hash(secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash secret: {}", e))?;
        Ok(hash.to_string())
    }

    /// Hash on the blocking thread pool
    pub async fn hash_async(secret: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash(&secret))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))?
    }

    /// `true` iff `presented` hashes to `stored_hash` (blocking).
    ///
    /// A stored value that is not a PHC string never matches.
    pub fn verify(presented: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "Stored credential is not a valid password hash");
                return false;
            }
        };

        Argon2::default()
            .verify_password(presented.as_bytes(), &parsed)
            .is_ok()
    }

    /// Verify on the blocking thread pool
    pub async fn verify_async(presented: String, stored_hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify(&presented, &stored_hash))
            .await
            .map_err(|e| anyhow::anyhow!("Task join error: {}", e))
    }
}

//! Argon2id hashing shared by passwords and single-use secrets.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Clone)]
pub struct SecretHasher {
    params: Params,
}

impl SecretHasher {
    pub fn new(config: &SecurityConfig) -> Result<Self> {
        let params = Params::new(
            config.argon2_memory_cost_kib,
            config.argon2_time_cost,
            config.argon2_parallelism,
            None,
        )
        .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

        Ok(Self { params })
    }

    /// Hashes `secret` into a salted PHC string.
    pub fn hash(&self, secret: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone());

        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| anyhow::anyhow!("Failed to hash secret: {e}"))?;

        Ok(hash.to_string())
    }

    /// Checks `secret` against a stored PHC string. A missing or malformed
    /// hash never matches.
    #[must_use]
    pub fn verify(secret: &str, hash: &str) -> bool {
        if hash.is_empty() {
            return false;
        }

        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            tracing::warn!("Stored hash is not a valid PHC string");
            return false;
        };

        // Cost parameters come from the PHC string itself.
        Argon2::default()
            .verify_password(secret.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Hashing is CPU-intensive, so the async variants run on the blocking pool.
    pub async fn hash_blocking(&self, secret: String) -> Result<String> {
        let hasher = self.clone();
        task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .context("Hashing task panicked")?
    }

    pub async fn verify_blocking(secret: String, hash: String) -> Result<bool> {
        task::spawn_blocking(move || Self::verify(&secret, &hash))
            .await
            .context("Hash verification task panicked")
    }
}

/// Low-cost hasher for unit tests.
#[cfg(test)]
pub(crate) fn cheap_hasher() -> SecretHasher {
    SecretHasher::new(&SecurityConfig {
        argon2_memory_cost_kib: 256,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    })
    .expect("static test params are valid")
}

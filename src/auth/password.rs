//! Password hashing

use rand::{distr::Alphanumeric, Rng};

use crate::error::{Error, Result};

/// Hash a plaintext password with bcrypt at the given cost
pub fn hash_password(password: &str, cost: u32) -> Result<String> {
    Ok(bcrypt::hash(password, cost)?)
}

/// Verify a plaintext password against a stored digest.
///
/// A malformed digest verifies as `false` rather than erroring, so callers
/// cannot tell a corrupt record from a wrong password.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    match bcrypt::verify(password, hashed) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!("Stored password digest could not be checked: {}", e);
            false
        }
    }
}

/// `hash_password` on the blocking pool
pub async fn hash_password_blocking(password: String, cost: u32) -> Result<String> {
    tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| Error::Other(format!("Password hashing task failed: {}", e)))?
}

/// `verify_password` on the blocking pool
pub async fn verify_password_blocking(password: String, hashed: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
        .await
        .map_err(|e| Error::Other(format!("Password check task failed: {}", e)))
}

/// Checks login attempts with one bcrypt verification per attempt, whether or
/// not the account exists. Unknown usernames are checked against a decoy
/// digest hashed at the same cost as real ones.
#[derive(Clone)]
pub struct CredentialVerifier {
    decoy: String,
}

impl CredentialVerifier {
    pub fn new(cost: u32) -> Result<Self> {
        let plaintext: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        Ok(Self {
            decoy: hash_password(&plaintext, cost)?,
        })
    }

    /// Digest the attempt is checked against
    fn digest_for<'a>(&'a self, stored: Option<&'a str>) -> &'a str {
        stored.unwrap_or(&self.decoy)
    }

    /// True only when the account exists and the password matches
    pub fn verify(&self, password: &str, stored: Option<&str>) -> bool {
        let matched = verify_password(password, self.digest_for(stored));
        stored.is_some() && matched
    }

    /// `verify` on the blocking pool
    pub async fn verify_blocking(&self, password: String, stored: Option<String>) -> Result<bool> {
        let verifier = self.clone();
        tokio::task::spawn_blocking(move || verifier.verify(&password, stored.as_deref()))
            .await
            .map_err(|e| Error::Other(format!("Password check task failed: {}", e)))
    }
}

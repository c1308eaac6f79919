//! Argon2 password hashing. Hashing is CPU bound, so the async wrappers hop
//! onto tokio's blocking pool.

use anyhow::Context;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

pub fn hash_password_blocking(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hash failed: {e}"))?;
    Ok(hash.to_string())
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password_blocking(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || hash_password_blocking(&password))
        .await
        .context("password hashing task failed")?
}

pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || verify_password_blocking(&password, &hash))
        .await
        .context("password verification task failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_verifiable() {
        let a = hash_password_blocking("hunter22").unwrap();
        let b = hash_password_blocking("hunter22").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("hunter22"));
        assert!(verify_password_blocking("hunter22", &a));
        assert!(!verify_password_blocking("hunter23", &a));
    }

    #[test]
    fn garbage_hash_never_verifies() {
        assert!(!verify_password_blocking("anything", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn async_wrappers_round_trip() {
        let hash = hash_password("s3cret!".into()).await.unwrap();
        assert!(verify_password("s3cret!".into(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".into(), hash).await.unwrap());
    }
}

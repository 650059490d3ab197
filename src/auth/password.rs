//! Argon2id password hashing. Both operations are CPU-heavy and run on the
//! blocking pool.

use anyhow::Context;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

fn hash_blocking(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hashing failed");
            anyhow::anyhow!("hash password: {e}")
        })
}

/// `Ok(false)` for a wrong password; `Err` only when the stored hash is
/// unreadable.
fn verify_blocking(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!("parse password hash: {e}")
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub async fn hash_password(plain: &str) -> anyhow::Result<String> {
    let plain = plain.to_owned();
    tokio::task::spawn_blocking(move || hash_blocking(&plain))
        .await
        .context("password hashing task")?
}

pub async fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let (plain, stored) = (plain.to_owned(), stored.to_owned());
    tokio::task::spawn_blocking(move || verify_blocking(&plain, &stored))
        .await
        .context("password verification task")?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stored_hash_verifies_only_the_original() {
        let hash = hash_password("hunter22").await.unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("hunter22", &hash).await.unwrap());
        assert!(!verify_password("hunter23", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn salts_differ() {
        let a = hash_password("wardrobe").await.unwrap();
        let b = hash_password("wardrobe").await.unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn unreadable_hash_is_an_error() {
        assert!(verify_blocking("anything", "plaintext-in-db").is_err());
    }
}

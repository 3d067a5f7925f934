use anyhow::Context;
use bcrypt::{hash, verify};

/// Hashes on the blocking pool; bcrypt at production cost takes long enough
/// to stall a runtime worker.
pub async fn hash_password(password: &str, cost: u32) -> anyhow::Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash(password, cost))
        .await
        .context("password hashing task failed")?
        .context("failed to hash password")
}

pub async fn verify_password(password: &str, hashed: &str) -> anyhow::Result<bool> {
    let password = password.to_string();
    let hashed = hashed.to_string();
    tokio::task::spawn_blocking(move || verify(password, &hashed))
        .await
        .context("password verification task failed")?
        .context("failed to verify password")
}

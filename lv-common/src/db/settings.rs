//! Settings table access

use crate::auth::generate_secret;
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

const TOKEN_SECRET_KEY: &str = "token_secret";

pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<Option<String>> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(value.flatten())
}

pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    Ok(())
}

/// Load the token signing secret, generating and storing one on first use
///
/// Tokens stay valid across restarts because the secret is persisted.
pub async fn load_or_init_token_secret(pool: &SqlitePool) -> Result<String> {
    if let Some(secret) = get_setting(pool, TOKEN_SECRET_KEY).await? {
        if !secret.is_empty() {
            return Ok(secret);
        }
    }

    let secret = generate_secret();
    set_setting(pool, TOKEN_SECRET_KEY, &secret).await?;
    info!("Generated new token signing secret");
    Ok(secret)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_token_secret_is_stable() {
        let pool = init_memory_database().await.unwrap();

        let first = load_or_init_token_secret(&pool).await.unwrap();
        let second = load_or_init_token_secret(&pool).await.unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_set_overwrites() {
        let pool = init_memory_database().await.unwrap();
        assert_eq!(get_setting(&pool, "k").await.unwrap(), None);

        set_setting(&pool, "k", "v1").await.unwrap();
        set_setting(&pool, "k", "v2").await.unwrap();
        assert_eq!(get_setting(&pool, "k").await.unwrap(), Some("v2".to_string()));
    }
}

//! User accounts

use crate::auth::PasswordHash;
use crate::db::songs::parse_guid;
use crate::models::User;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Create an account; `Error::Conflict` if the e-mail is already registered
pub async fn create_user(pool: &SqlitePool, email: &str, password: &PasswordHash) -> Result<User> {
    let user = User {
        id: Uuid::new_v4(),
        email: email.to_string(),
        created_at: Utc::now(),
    };

    let result = sqlx::query(
        "INSERT INTO users (guid, email, password_hash, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(password.as_str())
    .bind(user.created_at)
    .execute(pool)
    .await;

    match result {
        Ok(_) => Ok(user),
        Err(e) => {
            let err = Error::from(e);
            if err.is_unique_violation() {
                Err(Error::Conflict(format!("Email already registered: {}", email)))
            } else {
                Err(err)
            }
        }
    }
}

/// Look up an account and its stored password hash by e-mail
pub async fn find_credentials(pool: &SqlitePool, email: &str) -> Result<Option<(User, PasswordHash)>> {
    let row: Option<(String, String, String, DateTime<Utc>)> = sqlx::query_as(
        "SELECT guid, email, password_hash, created_at FROM users WHERE email = ?",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;

    row.map(|(guid, email, hash, created_at)| {
        Ok((
            User {
                id: parse_guid(&guid)?,
                email,
                created_at,
            },
            PasswordHash::from_stored(hash),
        ))
    })
    .transpose()
}

pub async fn get_user(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row: Option<(String, DateTime<Utc>)> =
        sqlx::query_as("SELECT email, created_at FROM users WHERE guid = ?")
            .bind(id.to_string())
            .fetch_optional(pool)
            .await?;

    Ok(row.map(|(email, created_at)| User {
        id,
        email,
        created_at,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_password;
    use crate::db::init_memory_database;

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = init_memory_database().await.unwrap();
        let password = hash_password("pw", 4).unwrap();

        let user = create_user(&pool, "fan@example.com", &password).await.unwrap();
        assert_eq!(get_user(&pool, user.id).await.unwrap(), Some(user.clone()));

        let err = create_user(&pool, "fan@example.com", &password).await.unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_credentials() {
        let pool = init_memory_database().await.unwrap();
        let password = hash_password("pw", 4).unwrap();
        let user = create_user(&pool, "fan@example.com", &password).await.unwrap();

        let (found, stored) = find_credentials(&pool, "fan@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(stored, password);

        assert!(find_credentials(&pool, "nobody@example.com").await.unwrap().is_none());
    }
}

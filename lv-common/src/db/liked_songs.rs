//! Liked-song references (user → song)
//!
//! A reference never owns its song: removing it leaves the song in place,
//! deleting the song removes every reference to it.

use crate::db::songs::{parse_guid, song_from_row};
use crate::models::LikedSong;
use crate::Result;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

/// Add `song_id` to the user's liked songs
///
/// Liking the same song twice keeps the original reference.
/// Returns the reference with the song expanded, or `None` when the
/// user or song does not exist.
pub async fn add_liked_song(pool: &SqlitePool, user_id: Uuid, song_id: Uuid) -> Result<Option<LikedSong>> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO liked_songs (guid, user_id, song_id, created_at)
        SELECT ?, u.guid, s.guid, ?
        FROM users u, songs s
        WHERE u.guid = ? AND s.guid = ?
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(Utc::now())
    .bind(user_id.to_string())
    .bind(song_id.to_string())
    .execute(pool)
    .await?;

    get_liked_song(pool, user_id, song_id).await
}

async fn get_liked_song(pool: &SqlitePool, user_id: Uuid, song_id: Uuid) -> Result<Option<LikedSong>> {
    let row = sqlx::query(
        r#"
        SELECT l.guid AS like_guid, l.created_at AS liked_at, s.*
        FROM liked_songs l
        JOIN songs s ON s.guid = l.song_id
        WHERE l.user_id = ? AND l.song_id = ?
        "#,
    )
    .bind(user_id.to_string())
    .bind(song_id.to_string())
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(liked_from_row).transpose()
}

/// All liked songs of a user, most recently liked first
pub async fn list_liked_songs(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<LikedSong>> {
    let rows = sqlx::query(
        r#"
        SELECT l.guid AS like_guid, l.created_at AS liked_at, s.*
        FROM liked_songs l
        JOIN songs s ON s.guid = l.song_id
        WHERE l.user_id = ?
        ORDER BY l.rowid DESC
        "#,
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter().map(liked_from_row).collect()
}

/// Remove a reference; false if the user had not liked the song
pub async fn remove_liked_song(pool: &SqlitePool, user_id: Uuid, song_id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM liked_songs WHERE user_id = ? AND song_id = ?")
        .bind(user_id.to_string())
        .bind(song_id.to_string())
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

fn liked_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<LikedSong> {
    let like_guid: String = row.try_get("like_guid")?;
    let liked_at: DateTime<Utc> = row.try_get("liked_at")?;
    Ok(LikedSong {
        id: parse_guid(&like_guid)?,
        song: song_from_row(row)?,
        created_at: liked_at,
    })
}

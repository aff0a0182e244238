//! Liked songs
//!
//! All routes here sit behind [`auth_middleware`](super::auth_middleware)
//! and only act on the token holder's own list.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use lv_common::db::{liked_songs, songs, users};
use lv_common::LikedSong;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::{parse_id, AuthUser};
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub song_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedSongsResponse {
    pub liked_songs: Vec<LikedSong>,
}

/// POST /users/:user_id/liked-songs `{ songId }`
///
/// Liking the same song twice is not an error; the existing reference is
/// returned.
pub async fn add_liked_song(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<LikeRequest>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = parse_id(&user_id, "user")?;
    auth.require(user_id)?;
    let song_id = parse_id(&body.song_id, "song")?;

    ensure_user(&state, user_id).await?;
    if songs::get_song(&state.db, song_id).await?.is_none() {
        return Err(ApiError::NotFound("Song not found".to_string()));
    }

    // Either row can vanish between the checks and the insert
    let liked = liked_songs::add_liked_song(&state.db, user_id, song_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Song not found".to_string()))?;

    info!(user_id = %user_id, song_id = %song_id, "Song liked");
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Song added to liked songs",
            "likedSong": liked,
        })),
    ))
}

/// GET /users/:user_id/liked-songs
pub async fn get_liked_songs(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<LikedSongsResponse>> {
    let user_id = parse_id(&user_id, "user")?;
    auth.require(user_id)?;
    ensure_user(&state, user_id).await?;

    let liked_songs = liked_songs::list_liked_songs(&state.db, user_id).await?;
    Ok(Json(LikedSongsResponse { liked_songs }))
}

/// POST /users/:user_id/remove-liked-song/:song_id
///
/// Removes the reference only; the song stays in the catalog.
pub async fn remove_liked_song(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path((user_id, song_id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let user_id = parse_id(&user_id, "user")?;
    auth.require(user_id)?;
    let song_id = parse_id(&song_id, "song")?;
    ensure_user(&state, user_id).await?;

    if !liked_songs::remove_liked_song(&state.db, user_id, song_id).await? {
        return Err(ApiError::NotFound(
            "Liked song not found for this user".to_string(),
        ));
    }

    info!(user_id = %user_id, song_id = %song_id, "Liked song removed");
    Ok(Json(json!({ "message": "Liked song removed successfully" })))
}

async fn ensure_user(state: &AppState, user_id: Uuid) -> ApiResult<()> {
    match users::get_user(&state.db, user_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::NotFound("User not found".to_string())),
    }
}

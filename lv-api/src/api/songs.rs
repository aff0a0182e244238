//! Song listing and administrative deletion

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use lv_common::db::songs;
use lv_common::SongRecord;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::{parse_id, AuthUser};
use crate::pagination::calculate_pagination;
use crate::{ApiError, ApiResult, AppState};

/// Query parameters for GET /api/songs
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    /// Same filter as /api/search-songs, applied before paginating
    pub keyword: Option<String>,
}

/// One page of songs, newest year first
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPage {
    pub total_count: i64,
    pub current_page: i64,
    pub total_pages: i64,
    pub data: Vec<SongRecord>,
}

/// GET /api/songs?page=&limit=&keyword=
pub async fn list_songs(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> ApiResult<Json<SongPage>> {
    let api = &state.config.api;
    let limit = params
        .limit
        .unwrap_or(api.default_page_size)
        .clamp(1, api.max_page_size.max(1));
    let keyword = params
        .keyword
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty());

    let total = songs::count_songs(&state.db, keyword).await?;
    let pagination = calculate_pagination(total, params.page.unwrap_or(1), limit);
    let data = songs::list_songs(&state.db, keyword, pagination.page_size, pagination.offset).await?;

    Ok(Json(SongPage {
        total_count: total,
        current_page: pagination.page,
        total_pages: pagination.total_pages,
        data,
    }))
}

/// DELETE /api/songs/:song_id
///
/// Liked-song references to the song are removed with it.
pub async fn delete_song(
    State(state): State<AppState>,
    axum::Extension(user): axum::Extension<AuthUser>,
    Path(song_id): Path<String>,
) -> ApiResult<StatusCode> {
    let song_id = parse_id(&song_id, "song")?;

    if !songs::delete_song(&state.db, song_id).await? {
        return Err(ApiError::NotFound("Song not found".to_string()));
    }

    info!(song_id = %song_id, user_id = %user.0, "Song deleted");
    Ok(StatusCode::NO_CONTENT)
}

//! Search and movie-name lookups

use axum::{
    extract::{Query, State},
    Json,
};
use lv_common::db::songs;
use lv_common::SongRecord;
use serde::Deserialize;
use tracing::debug;

use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// GET /api/search-songs?q=
///
/// Returns the matches as a bare array, capped at `[api] search_limit`;
/// 404 when nothing matches.
pub async fn search_songs(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Vec<SongRecord>>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter 'q' is required".to_string()))?;

    let found = songs::search_songs(&state.db, query, state.config.api.search_limit).await?;
    debug!(query, matches = found.len(), "Song search");

    if found.is_empty() {
        return Err(ApiError::NotFound("No songs found".to_string()));
    }
    Ok(Json(found))
}

/// GET /api/getMovieNames
pub async fn movie_names(State(state): State<AppState>) -> ApiResult<Json<Vec<String>>> {
    Ok(Json(songs::distinct_movies(&state.db).await?))
}

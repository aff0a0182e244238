//! HTTP API handlers for lv-api

pub mod auth;
pub mod health;
pub mod jobs;
pub mod likes;
pub mod search;
pub mod songs;
pub mod users;

pub use auth::{auth_middleware, AuthUser};
pub use health::health_routes;
pub use jobs::{check_and_remove_duplicates, crawl_status, spawn_crawl, start_crawl};
pub use likes::{add_liked_song, get_liked_songs, remove_liked_song};
pub use search::{movie_names, search_songs};
pub use songs::{delete_song, list_songs};
pub use users::{login, register};

use crate::ApiError;
use uuid::Uuid;

/// Parse an id taken from the path or a request body
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {} id: {}", what, raw)))
}

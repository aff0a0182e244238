//! lv-api library - HTTP surface over the song catalog
//!
//! Listing, search and liked songs over the shared SQLite store, plus
//! endpoints that start a crawl or a duplicate reconciliation on demand.

use axum::Router;
use lv_common::config::AppConfig;
use lv_ingest::{CrawlReport, Crawler, Reconciler};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub mod api;
pub mod error;
pub mod pagination;
pub mod triggers;

pub use error::{ApiError, ApiResult};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Single crawler instance; at most one crawl runs at a time
    pub crawler: Crawler,
    pub reconciler: Reconciler,
    pub config: Arc<AppConfig>,
    /// Signing secret for bearer tokens
    pub token_secret: Arc<str>,
    /// Report of the most recent finished crawl
    pub last_crawl: Arc<RwLock<Option<CrawlReport>>>,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, crawler: Crawler, config: AppConfig, token_secret: String) -> Self {
        Self {
            reconciler: Reconciler::new(db.clone()),
            db,
            crawler,
            config: Arc::new(config),
            token_secret: Arc::from(token_secret),
            last_crawl: Arc::new(RwLock::new(None)),
        }
    }

    /// Issue a bearer token for `user_id` valid for `[auth] token_ttl_hours`
    pub fn issue_token(&self, user_id: Uuid) -> String {
        let ttl_ms = i64::try_from(self.config.auth.token_ttl_hours)
            .unwrap_or(i64::MAX)
            .saturating_mul(3_600_000);
        lv_common::auth::issue_token(user_id, &self.token_secret, now_ms(), ttl_ms)
    }
}

pub(crate) fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Build application router
///
/// Liked-song routes and song deletion require a bearer token; everything
/// else is public.
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    // Protected routes (require authentication)
    let protected = Router::new()
        .route("/api/songs/:song_id", delete(api::delete_song))
        .route(
            "/users/:user_id/liked-songs",
            post(api::add_liked_song).get(api::get_liked_songs),
        )
        .route(
            "/users/:user_id/remove-liked-song/:song_id",
            post(api::remove_liked_song),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth_middleware,
        ));

    // Public routes (no authentication)
    let public = Router::new()
        .route("/api/songs", get(api::list_songs))
        .route("/api/search-songs", get(api::search_songs))
        .route("/api/getMovieNames", get(api::movie_names))
        .route("/checkAndRemoveDuplicates", get(api::check_and_remove_duplicates))
        .route("/api/crawl", post(api::start_crawl))
        .route("/api/crawl/status", get(api::crawl_status))
        .route("/register", post(api::register))
        .route("/login", post(api::login))
        .merge(api::health_routes());

    Router::new()
        .merge(protected)
        .merge(public)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

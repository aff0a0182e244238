//! Crawl and reconciliation triggers
//!
//! A crawl runs in the background and its report is kept in
//! [`AppState::last_crawl`]. Reconciliation is short and runs inline.

use axum::{extract::State, http::StatusCode, Json};
use lv_ingest::{CrawlError, CrawlPhase, CrawlReport, CrawlSeed, ReconcileReport};
use serde::Serialize;
use serde_json::{json, Value};
use tokio::task::JoinHandle;
use tracing::info;

use crate::{ApiResult, AppState};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlStatus {
    pub phase: CrawlPhase,
    pub running: bool,
    pub last_report: Option<CrawlReport>,
}

/// Claim the crawler and run one crawl from the configured seed
///
/// Fails immediately with [`CrawlError::AlreadyRunning`] if another crawl
/// holds the crawler. The returned task stores the report when it finishes.
pub fn spawn_crawl(state: &AppState) -> Result<JoinHandle<()>, CrawlError> {
    let seed = CrawlSeed::from_config(&state.config.crawl)?;
    let run = state.crawler.begin()?;

    let last_crawl = state.last_crawl.clone();
    Ok(tokio::spawn(async move {
        let report = run.run(seed).await;
        info!(
            inserted = report.records_inserted,
            fetch_failures = report.fetch_failures,
            "Crawl finished"
        );
        *last_crawl.write().await = Some(report);
    }))
}

/// POST /api/crawl
///
/// 202 once the crawl has started; 409 if one is already running.
pub async fn start_crawl(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    spawn_crawl(&state)?;
    info!("Crawl started on request");
    Ok((
        StatusCode::ACCEPTED,
        Json(json!({ "message": "Crawl started" })),
    ))
}

/// GET /api/crawl/status
pub async fn crawl_status(State(state): State<AppState>) -> Json<CrawlStatus> {
    let last_report = state.last_crawl.read().await.clone();
    Json(CrawlStatus {
        phase: state.crawler.phase(),
        running: state.crawler.is_running(),
        last_report,
    })
}

/// GET /checkAndRemoveDuplicates
pub async fn check_and_remove_duplicates(
    State(state): State<AppState>,
) -> ApiResult<Json<ReconcileReport>> {
    Ok(Json(state.reconciler.reconcile().await?))
}

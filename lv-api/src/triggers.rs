//! In-process daily triggers for crawl and reconcile
//!
//! Times come from `[schedule]`. A crawl trigger that finds a crawl already
//! running skips that day's run.

use lv_common::Result;
use lv_ingest::schedule::{spawn_daily, DailySchedule};
use lv_ingest::CrawlError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::spawn_crawl;
use crate::AppState;

/// Start both daily jobs; returns no handles when scheduling is disabled
pub fn spawn_triggers(state: &AppState) -> Result<Vec<JoinHandle<()>>> {
    let config = &state.config.schedule;
    if !config.enabled {
        info!("Scheduled triggers disabled");
        return Ok(Vec::new());
    }

    let crawl_schedule = DailySchedule::crawl(config)?;
    let reconcile_schedule = DailySchedule::reconcile(config)?;

    let crawl_state = state.clone();
    let crawl = spawn_daily("crawl", crawl_schedule, move || {
        let state = crawl_state.clone();
        async move {
            match spawn_crawl(&state) {
                Ok(handle) => {
                    if let Err(e) = handle.await {
                        error!(error = %e, "Scheduled crawl task failed");
                    }
                }
                Err(CrawlError::AlreadyRunning) => {
                    warn!("Crawl already running, skipping scheduled run");
                }
                Err(e) => error!(error = %e, "Scheduled crawl could not start"),
            }
        }
    });

    let reconciler = state.reconciler.clone();
    let reconcile = spawn_daily("reconcile", reconcile_schedule, move || {
        let reconciler = reconciler.clone();
        async move {
            if let Err(e) = reconciler.reconcile().await {
                error!(error = %e, "Scheduled reconciliation failed");
            }
        }
    });

    Ok(vec![crawl, reconcile])
}

//! lv-ingest - one-shot crawl and duplicate reconciliation
//!
//! Meant to be invoked by cron or any other external scheduler:
//!
//! ```text
//! lv-ingest crawl                              # crawl from the configured seed
//! lv-ingest crawl --year-from 2014 --year-to 2016
//! lv-ingest reconcile
//! ```
//!
//! The run report is printed to stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lv_common::config::{AppConfig, Overrides, YearRangeSeed};
use lv_common::db::init_database;
use lv_ingest::{CrawlSeed, Crawler, Reconciler};
use std::path::PathBuf;
use tracing::{error, info};

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "lv-ingest")]
#[command(about = "Crawl the catalog site and reconcile duplicate songs")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "LYRICVAULT_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database file
    #[arg(short, long, env = "LYRICVAULT_DATABASE")]
    database: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, env = "LYRICVAULT_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl the catalog and store new songs
    Crawl {
        /// First year page to crawl (requires --year-to)
        #[arg(long, requires = "year_to")]
        year_from: Option<i32>,

        /// Last year page to crawl (requires --year-from)
        #[arg(long, requires = "year_from")]
        year_to: Option<i32>,
    },

    /// Remove duplicate songs by name and by URL
    Reconcile,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = AppConfig::load(args.config.as_deref())?;
    config.apply_overrides(Overrides {
        database_path: args.database,
        port: None,
        log_level: args.log_level,
    });

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Starting lv-ingest v{}", env!("CARGO_PKG_VERSION"));
    info!("Database path: {}", config.database_path.display());

    let pool = match init_database(&config.database_path).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            return Err(e.into());
        }
    };

    let output = match args.command {
        Command::Crawl { year_from, year_to } => {
            let seed = match (year_from, year_to) {
                (Some(from), Some(to)) => {
                    anyhow::ensure!(from <= to, "--year-from {} is after --year-to {}", from, to);
                    let template = config
                        .crawl
                        .year_range
                        .as_ref()
                        .map(|r| r.url_template.clone())
                        .unwrap_or_else(|| default_year_template(&config.crawl.catalog_url));
                    let range = YearRangeSeed {
                        from,
                        to,
                        url_template: template,
                    };
                    CrawlSeed::year_range(&range)?
                }
                _ => CrawlSeed::from_config(&config.crawl)?,
            };

            let crawler = Crawler::from_config(&config, pool.clone())?;
            let report = crawler.crawl(seed).await?;
            serde_json::to_string_pretty(&report)?
        }
        Command::Reconcile => {
            let report = Reconciler::new(pool.clone())
                .reconcile()
                .await
                .context("Reconciliation failed")?;
            serde_json::to_string_pretty(&report)?
        }
    };

    println!("{}", output);
    pool.close().await;
    Ok(())
}

/// `{catalog_url}/tamil-{year}-songs/`, the site's per-year path
fn default_year_template(catalog_url: &str) -> String {
    format!("{}/tamil-{{year}}-songs/", catalog_url.trim_end_matches('/'))
}

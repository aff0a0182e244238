//! Crawl orchestrator
//!
//! Walks the catalog level by level:
//!
//! ```text
//! catalog root ──► year pages ──► listing pages ──► album pages ──► sink
//!  ListingYears    ListingPages    ListingPages     FetchingAlbums
//! ```
//!
//! Every level is a bounded worker pool (`buffer_unordered(max_concurrency)`)
//! over the targets produced by the previous level. A failing target is
//! recorded in the report and never stops its siblings. Each album's drafts
//! go to the sink as their own batch.

use crate::error::{CrawlError, SinkError};
use crate::extractors::{self, Extraction, ParseRejection, SiteSelectors};
use crate::fetcher::{HttpFetcher, Page, PageFetcher};
use crate::report::{CrawlReport, FailureStage};
use crate::sink::UpsertSink;
use crate::target::{CrawlTarget, TargetLevel};
use futures::stream::{self, StreamExt};
use lv_common::config::{AppConfig, CrawlConfig, YearRangeSeed, DEFAULT_MAX_PAGES_PER_YEAR};
use scraper::Html;
use serde::Serialize;
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use url::Url;

/// Where the crawler currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrawlPhase {
    Idle,
    ListingYears,
    ListingPages,
    FetchingAlbums,
}

/// Starting point of a crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CrawlSeed {
    /// Discover year pages from the catalog root
    Catalog(Url),
    /// Start directly from known year pages
    YearPages(Vec<Url>),
}

impl CrawlSeed {
    /// Year range when configured, catalog root otherwise
    pub fn from_config(config: &CrawlConfig) -> Result<Self, CrawlError> {
        match &config.year_range {
            Some(range) => Self::year_range(range),
            None => Ok(CrawlSeed::Catalog(parse_url(&config.catalog_url)?)),
        }
    }

    pub fn year_range(range: &YearRangeSeed) -> Result<Self, CrawlError> {
        let urls = range
            .urls()
            .iter()
            .map(|u| parse_url(u))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(CrawlSeed::YearPages(urls))
    }
}

fn parse_url(raw: &str) -> Result<Url, CrawlError> {
    Url::parse(raw).map_err(|e| {
        crate::error::FetchError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Shared crawler; cheap to clone
#[derive(Clone)]
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    selectors: Arc<SiteSelectors>,
    sink: UpsertSink,
    max_concurrency: usize,
    max_pages_per_year: u32,
    phase: Arc<Mutex<CrawlPhase>>,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        selectors: SiteSelectors,
        sink: UpsertSink,
        max_concurrency: usize,
    ) -> Self {
        Self {
            fetcher,
            selectors: Arc::new(selectors),
            sink,
            max_concurrency: max_concurrency.max(1),
            max_pages_per_year: DEFAULT_MAX_PAGES_PER_YEAR,
            phase: Arc::new(Mutex::new(CrawlPhase::Idle)),
        }
    }

    /// Listing pages fetched per year at most
    pub fn with_max_pages_per_year(mut self, max_pages: u32) -> Self {
        self.max_pages_per_year = max_pages.max(1);
        self
    }

    /// HTTP crawler writing to `db`, configured from the `[crawl]` and `[selectors]` sections
    pub fn from_config(config: &AppConfig, db: SqlitePool) -> Result<Self, CrawlError> {
        let fetcher = HttpFetcher::new(&config.crawl)?;
        let selectors = SiteSelectors::compile(&config.selectors)?;
        let sink = UpsertSink::new(db, config.crawl.conflict_policy);
        Ok(Self::new(
            Arc::new(fetcher),
            selectors,
            sink,
            config.crawl.max_concurrency,
        )
        .with_max_pages_per_year(config.crawl.max_pages_per_year))
    }

    pub fn phase(&self) -> CrawlPhase {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn is_running(&self) -> bool {
        self.phase() != CrawlPhase::Idle
    }

    /// Claim the crawler; fails if a crawl is already in progress
    ///
    /// The claim is released when the returned run is finished or dropped.
    pub fn begin(&self) -> Result<CrawlRun, CrawlError> {
        let mut phase = self.phase.lock().unwrap_or_else(|e| e.into_inner());
        if *phase != CrawlPhase::Idle {
            return Err(CrawlError::AlreadyRunning);
        }
        *phase = CrawlPhase::ListingYears;
        Ok(CrawlRun {
            crawler: self.clone(),
            _guard: PhaseGuard {
                phase: Arc::clone(&self.phase),
            },
        })
    }

    /// Claim, run to completion and return the report
    pub async fn crawl(&self, seed: CrawlSeed) -> Result<CrawlReport, CrawlError> {
        Ok(self.begin()?.run(seed).await)
    }

    fn set_phase(&self, next: CrawlPhase) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = next;
    }

    /// Run `visit` over `targets` with at most `max_concurrency` in flight
    async fn fan_out<T, F, Fut>(&self, targets: Vec<CrawlTarget>, visit: F) -> (Vec<T>, CrawlReport)
    where
        F: Fn(Crawler, CrawlTarget) -> Fut,
        Fut: Future<Output = (Vec<T>, CrawlReport)>,
    {
        let results: Vec<(Vec<T>, CrawlReport)> = stream::iter(targets)
            .map(|target| visit(self.clone(), target))
            .buffer_unordered(self.max_concurrency)
            .collect()
            .await;

        let mut items = Vec::new();
        let mut report = CrawlReport::default();
        for (found, partial) in results {
            items.extend(found);
            report.merge(partial);
        }
        (items, report)
    }

    /// Fetch a target, recording a failure in `report` on error
    async fn fetch(&self, target: &CrawlTarget, report: &mut CrawlReport) -> Option<Page> {
        match self.fetcher.fetch(&target.url).await {
            Ok(page) => {
                report.pages_fetched += 1;
                Some(page)
            }
            Err(e) => {
                tracing::warn!(url = %target.url, level = %target.level, error = %e, "Fetch failed");
                report.record_failure(target, FailureStage::Fetch, e.to_string());
                None
            }
        }
    }

    /// Follow links found on a page, counting unresolvable ones as parse failures
    async fn visit_links(
        &self,
        target: CrawlTarget,
        extract: fn(&Html, &Url, &SiteSelectors) -> Extraction<Url>,
    ) -> (Vec<Url>, CrawlReport) {
        let mut report = CrawlReport::default();
        let Some(page) = self.fetch(&target, &mut report).await else {
            return (Vec::new(), report);
        };

        let extraction = parse_page(&page, |doc, base| extract(doc, base, &self.selectors));
        record_rejections(&mut report, &target, extraction.rejected);

        tracing::debug!(url = %target.url, level = %target.level, found = extraction.items.len(), "Links extracted");
        (extraction.items, report)
    }

    /// Year page → its numbered listing pages
    async fn visit_year(&self, target: CrawlTarget) -> (Vec<Url>, CrawlReport) {
        let mut report = CrawlReport::default();
        let Some(page) = self.fetch(&target, &mut report).await else {
            return (Vec::new(), report);
        };

        let count = parse_page(&page, |doc, _| extractors::extract_page_count(doc, &self.selectors));
        let pages = extractors::page_urls(&target.url, count, self.max_pages_per_year);
        record_rejections(&mut report, &target, pages.rejected);

        tracing::debug!(url = %target.url, pages = pages.items.len(), "Year paginated");
        (pages.items, report)
    }

    /// Album page → drafts → sink
    async fn visit_album(&self, target: CrawlTarget) -> CrawlReport {
        let mut report = CrawlReport::default();
        let Some(page) = self.fetch(&target, &mut report).await else {
            return report;
        };
        report.albums_visited += 1;

        let extraction = parse_page(&page, |doc, base| {
            extractors::extract_songs(doc, base, &self.selectors)
        });
        report.drafts_extracted += extraction.items.len();
        report.entries_skipped += extraction.rejected.len();

        match self.sink.upsert(&extraction.items).await {
            Ok(outcome) => {
                report.records_inserted += outcome.inserted;
                report.entries_skipped += outcome.skipped;
                if outcome.inserted > 0 {
                    tracing::info!(url = %target.url, inserted = outcome.inserted, "Songs saved");
                }
            }
            Err(SinkError::ConstraintViolation { field, value }) => {
                report.batches_conflicted += 1;
                tracing::info!(
                    url = %target.url,
                    key = %field,
                    value = %value,
                    dropped = extraction.items.len(),
                    "Batch dropped, song already stored"
                );
            }
            Err(e) => {
                tracing::error!(url = %target.url, error = %e, "Failed to store batch");
                report.record_failure(&target, FailureStage::Sink, e.to_string());
            }
        }

        report
    }
}

/// Exclusive right to run one crawl
pub struct CrawlRun {
    crawler: Crawler,
    _guard: PhaseGuard,
}

impl CrawlRun {
    pub async fn run(self, seed: CrawlSeed) -> CrawlReport {
        let crawler = &self.crawler;
        let started = Instant::now();
        let mut report = CrawlReport::default();

        // Level 1: year pages
        crawler.set_phase(CrawlPhase::ListingYears);
        let year_urls = match seed {
            CrawlSeed::Catalog(root) => {
                tracing::info!(url = %root, "Crawl started from catalog root");
                let target = CrawlTarget::new(root, TargetLevel::YearIndex);
                let (urls, partial) = crawler
                    .visit_links(target, extractors::extract_year_links)
                    .await;
                report.merge(partial);
                urls
            }
            CrawlSeed::YearPages(urls) => {
                tracing::info!(years = urls.len(), "Crawl started from year pages");
                urls
            }
        };

        // Level 2: pagination, then album links per listing page
        crawler.set_phase(CrawlPhase::ListingPages);
        let (listing_urls, partial) = crawler
            .fan_out(
                CrawlTarget::all(year_urls, TargetLevel::PaginationIndex),
                |c, t| async move { c.visit_year(t).await },
            )
            .await;
        report.merge(partial);

        let (album_urls, partial) = crawler
            .fan_out(
                CrawlTarget::all(listing_urls, TargetLevel::ListingPage),
                |c, t| async move { c.visit_links(t, extractors::extract_album_links).await },
            )
            .await;
        report.merge(partial);

        // An album linked from several listings is visited once
        let mut seen = HashSet::new();
        let album_urls: Vec<Url> = album_urls
            .into_iter()
            .filter(|u| seen.insert(u.clone()))
            .collect();

        // Level 3: albums
        crawler.set_phase(CrawlPhase::FetchingAlbums);
        tracing::info!(albums = album_urls.len(), "Fetching album pages");
        let (_, partial) = crawler
            .fan_out(
                CrawlTarget::all(album_urls, TargetLevel::AlbumPage),
                |c, t| async move { (Vec::<()>::new(), c.visit_album(t).await) },
            )
            .await;
        report.merge(partial);

        tracing::info!(
            pages_fetched = report.pages_fetched,
            albums = report.albums_visited,
            inserted = report.records_inserted,
            conflicted = report.batches_conflicted,
            failures = report.failures.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Crawl finished"
        );

        report
    }
}

/// Returns the crawler to `Idle` however the run ends
struct PhaseGuard {
    phase: Arc<Mutex<CrawlPhase>>,
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        *self.phase.lock().unwrap_or_else(|e| e.into_inner()) = CrawlPhase::Idle;
    }
}

/// Parse and extract synchronously; the document tree never outlives this call
fn parse_page<T>(page: &Page, extract: impl FnOnce(&Html, &Url) -> T) -> T {
    let doc = page.document();
    extract(&doc, &page.url)
}

fn record_rejections(report: &mut CrawlReport, target: &CrawlTarget, rejected: Vec<ParseRejection>) {
    for rejection in rejected {
        tracing::warn!(url = %target.url, reason = %rejection.reason, "Unusable link");
        report.record_failure(target, FailureStage::Parse, rejection.reason);
    }
}

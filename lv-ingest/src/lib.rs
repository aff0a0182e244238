//! # lyricvault ingest pipeline
//!
//! Scrapes the catalog site into the songs table:
//! - [`fetcher`]: one GET per page, behind the [`PageFetcher`] trait
//! - [`extractors`]: pure functions from a parsed page to child URLs or song drafts
//! - [`crawler`]: level-by-level traversal with a bounded worker pool
//! - [`sink`]: batch insert with per-batch conflict handling
//! - [`reconciler`]: after-the-fact removal of duplicate songs
//! - [`schedule`]: daily trigger times

pub mod crawler;
pub mod error;
pub mod extractors;
pub mod fetcher;
pub mod reconciler;
pub mod report;
pub mod schedule;
pub mod sink;
pub mod target;

pub use crawler::{CrawlPhase, CrawlRun, CrawlSeed, Crawler};
pub use error::{CrawlError, FetchError, ParseError, SinkError};
pub use fetcher::{HttpFetcher, Page, PageFetcher};
pub use reconciler::Reconciler;
pub use report::{CrawlFailure, CrawlReport, DuplicateGroup, FailureStage, ReconcileReport};
pub use sink::{SinkOutcome, UpsertSink};
pub use target::{CrawlTarget, TargetLevel};

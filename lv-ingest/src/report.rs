//! Run reports returned by the crawl and the reconciler

use crate::target::{CrawlTarget, TargetLevel};
use lv_common::KeyField;
use serde::Serialize;

/// Stage in which a crawl target failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureStage {
    Fetch,
    Parse,
    Sink,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    pub url: String,
    pub level: TargetLevel,
    pub stage: FailureStage,
    pub message: String,
}

/// Counters for one crawl, merged up from every target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub pages_fetched: usize,
    pub fetch_failures: usize,
    pub parse_failures: usize,
    pub albums_visited: usize,
    pub drafts_extracted: usize,
    /// Ringtone entries dropped for missing data, plus records skipped as known
    pub entries_skipped: usize,
    pub records_inserted: usize,
    /// Batches dropped because a record was already stored
    pub batches_conflicted: usize,
    /// Batches lost to a database error
    pub batches_failed: usize,
    pub failures: Vec<CrawlFailure>,
}

impl CrawlReport {
    pub fn merge(&mut self, other: CrawlReport) {
        self.pages_fetched += other.pages_fetched;
        self.fetch_failures += other.fetch_failures;
        self.parse_failures += other.parse_failures;
        self.albums_visited += other.albums_visited;
        self.drafts_extracted += other.drafts_extracted;
        self.entries_skipped += other.entries_skipped;
        self.records_inserted += other.records_inserted;
        self.batches_conflicted += other.batches_conflicted;
        self.batches_failed += other.batches_failed;
        self.failures.extend(other.failures);
    }

    pub(crate) fn record_failure(
        &mut self,
        target: &CrawlTarget,
        stage: FailureStage,
        message: impl Into<String>,
    ) {
        match stage {
            FailureStage::Fetch => self.fetch_failures += 1,
            FailureStage::Parse => self.parse_failures += 1,
            FailureStage::Sink => self.batches_failed += 1,
        }
        self.failures.push(CrawlFailure {
            url: target.url.to_string(),
            level: target.level,
            stage,
            message: message.into(),
        });
    }

    /// True when nothing at all went wrong
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Songs removed for one duplicated key value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    pub key: KeyField,
    pub value: String,
    pub removed: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    pub groups: Vec<DuplicateGroup>,
    pub total_removed: u64,
}

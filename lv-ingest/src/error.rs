//! Error types for the ingest pipeline

use lv_common::KeyField;
use thiserror::Error;

/// Page could not be retrieved
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Unreadable body from {url}: {message}")]
    Body { url: String, message: String },
}

/// Document structure could not be interpreted
///
/// Never fatal: the affected page contributes zero results.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid selector {name} = {selector:?}: {message}")]
    Selector {
        name: &'static str,
        selector: String,
        message: String,
    },

    #[error("Unresolvable link {href:?}: {message}")]
    Url { href: String, message: String },

    #[error("Pagination advertises {advertised} pages, keeping the first {cap}")]
    PageCountCapped { advertised: u32, cap: u32 },
}

/// Batch could not be persisted
#[derive(Debug, Error)]
pub enum SinkError {
    /// A record collides with a known song on a unique key
    #[error("Constraint violation: {field} {value:?} already stored")]
    ConstraintViolation { field: KeyField, value: String },

    #[error(transparent)]
    Database(#[from] lv_common::Error),
}

/// Crawl could not start
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("A crawl is already running")]
    AlreadyRunning,

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),
}

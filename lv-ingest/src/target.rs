//! Units of crawl work

use serde::Serialize;
use std::fmt;
use url::Url;

/// Page shape a URL is expected to have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetLevel {
    /// Catalog root listing one link per year
    YearIndex,
    /// Year page carrying the numbered pagination controls
    PaginationIndex,
    /// One numbered listing page of album thumbnails
    ListingPage,
    /// Album detail page with the ringtone entries
    AlbumPage,
}

impl fmt::Display for TargetLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetLevel::YearIndex => "year-index",
            TargetLevel::PaginationIndex => "pagination-index",
            TargetLevel::ListingPage => "listing-page",
            TargetLevel::AlbumPage => "album-page",
        };
        f.write_str(name)
    }
}

/// A URL tagged with its level; produced by one extraction stage, consumed by the next
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    pub url: Url,
    pub level: TargetLevel,
}

impl CrawlTarget {
    pub fn new(url: Url, level: TargetLevel) -> Self {
        Self { url, level }
    }

    /// Tag every URL with the same level
    pub fn all(urls: impl IntoIterator<Item = Url>, level: TargetLevel) -> Vec<Self> {
        urls.into_iter().map(|url| Self::new(url, level)).collect()
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.level, self.url)
    }
}

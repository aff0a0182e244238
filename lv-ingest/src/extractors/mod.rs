//! Pure extractors, one per page shape
//!
//! Each takes an already-parsed document plus the URL it came from and
//! returns what it found together with the entries it had to reject.
//! No extractor performs I/O or fails as a whole: a selector that matches
//! nothing simply yields nothing.

pub mod album;
pub mod album_links;
pub mod pagination;
pub mod selectors;
pub mod year_index;

pub use album::{extract_details, extract_songs, AlbumDetails};
pub use album_links::extract_album_links;
pub use pagination::{extract_page_count, max_page_number, page_urls};
pub use selectors::SiteSelectors;
pub use year_index::extract_year_links;

use crate::error::ParseError;
use scraper::ElementRef;
use url::Url;

/// Items found on one page plus the entries that could not be used
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction<T> {
    pub items: Vec<T>,
    pub rejected: Vec<ParseRejection>,
}

impl<T> Extraction<T> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            rejected: Vec::new(),
        }
    }
}

impl<T> Default for Extraction<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Why one entry on a page was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseRejection {
    pub reason: String,
}

impl From<ParseError> for ParseRejection {
    fn from(e: ParseError) -> Self {
        Self {
            reason: e.to_string(),
        }
    }
}

/// Resolve an element's `href` against the page URL
fn resolve_href(element: ElementRef<'_>, base: &Url) -> Result<Url, ParseError> {
    let href = element
        .value()
        .attr("href")
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| ParseError::Url {
            href: String::new(),
            message: "missing href".to_string(),
        })?;

    base.join(href).map_err(|e| ParseError::Url {
        href: href.to_string(),
        message: e.to_string(),
    })
}

/// Collect resolved links, dropping repeats while keeping document order
fn collect_links<'a>(elements: impl Iterator<Item = ElementRef<'a>>, base: &Url) -> Extraction<Url> {
    let mut extraction = Extraction::new();
    for element in elements {
        match resolve_href(element, base) {
            Ok(url) => {
                if !extraction.items.contains(&url) {
                    extraction.items.push(url);
                }
            }
            Err(e) => extraction.rejected.push(e.into()),
        }
    }
    extraction
}

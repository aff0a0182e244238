//! Year page → numbered listing pages

use super::{Extraction, SiteSelectors};
use crate::error::ParseError;
use scraper::Html;
use url::Url;

/// Highest page number among pagination link texts
///
/// Non-numeric texts ("Next", "»") are ignored. A year with no numeric
/// controls is a single page.
///
/// # Examples
///
/// ```
/// use lv_ingest::extractors::max_page_number;
///
/// assert_eq!(max_page_number(["1", "2", "10", "Next"]), 10);
/// assert_eq!(max_page_number(["Next"]), 1);
/// ```
pub fn max_page_number<'a>(texts: impl IntoIterator<Item = &'a str>) -> u32 {
    texts
        .into_iter()
        .filter_map(|t| t.trim().parse::<u32>().ok())
        .filter(|&n| n > 0)
        .max()
        .unwrap_or(1)
}

/// Page count of a year listing
pub fn extract_page_count(doc: &Html, selectors: &SiteSelectors) -> u32 {
    let texts: Vec<String> = doc
        .select(&selectors.pagination_links)
        .map(|a| a.text().collect::<String>())
        .collect();
    max_page_number(texts.iter().map(String::as_str))
}

/// `{year_url}/page/1` … `{year_url}/page/{count}`, at most `max_pages` of them
///
/// A count above `max_pages` is truncated and recorded as a rejection.
pub fn page_urls(year_url: &Url, count: u32, max_pages: u32) -> Extraction<Url> {
    let base = year_url.as_str().trim_end_matches('/');
    let mut extraction = Extraction::new();
    if count > max_pages {
        extraction.rejected.push(
            ParseError::PageCountCapped {
                advertised: count,
                cap: max_pages,
            }
            .into(),
        );
    }
    for n in 1..=count.min(max_pages) {
        let href = format!("{}/page/{}", base, n);
        match Url::parse(&href) {
            Ok(url) => extraction.items.push(url),
            Err(e) => extraction.rejected.push(
                ParseError::Url {
                    href,
                    message: e.to_string(),
                }
                .into(),
            ),
        }
    }
    extraction
}

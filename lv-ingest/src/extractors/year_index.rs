//! Catalog root → year pages

use super::{collect_links, Extraction, SiteSelectors};
use scraper::Html;
use url::Url;

/// Year page URLs from the catalog's navigation block, in document order
pub fn extract_year_links(doc: &Html, base: &Url, selectors: &SiteSelectors) -> Extraction<Url> {
    collect_links(doc.select(&selectors.year_links), base)
}

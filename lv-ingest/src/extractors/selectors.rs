//! Compiled CSS selectors

use crate::error::ParseError;
use lv_common::config::SelectorConfig;
use scraper::Selector;

/// Selectors for every page shape, compiled once per crawler
#[derive(Debug, Clone)]
pub struct SiteSelectors {
    pub year_links: Selector,
    pub pagination_links: Selector,
    pub album_links: Selector,
    pub details_block: Selector,
    pub details_label: Selector,
    pub ringtone_entry: Selector,
    pub song_name: Selector,
    pub download_link: Selector,
}

impl SiteSelectors {
    pub fn compile(config: &SelectorConfig) -> Result<Self, ParseError> {
        Ok(Self {
            year_links: parse("year_links", &config.year_links)?,
            pagination_links: parse("pagination_links", &config.pagination_links)?,
            album_links: parse("album_links", &config.album_links)?,
            details_block: parse("details_block", &config.details_block)?,
            details_label: parse("details_label", &config.details_label)?,
            ringtone_entry: parse("ringtone_entry", &config.ringtone_entry)?,
            song_name: parse("song_name", &config.song_name)?,
            download_link: parse("download_link", &config.download_link)?,
        })
    }
}

impl Default for SiteSelectors {
    fn default() -> Self {
        // Built-in selectors are constants known to parse
        Self::compile(&SelectorConfig::default()).expect("default selectors are valid")
    }
}

fn parse(name: &'static str, selector: &str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        name,
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

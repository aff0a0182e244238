//! In-memory PageFetcher

use async_trait::async_trait;
use lv_ingest::{FetchError, Page, PageFetcher};
use std::collections::HashMap;
use std::sync::Mutex;
use url::Url;

use super::FixturePage;

/// Serves fixture pages under `base`; anything else is a 404
pub struct FixtureFetcher {
    pages: HashMap<String, String>,
    requested: Mutex<Vec<String>>,
}

impl FixtureFetcher {
    pub fn new(base: &str, site: Vec<FixturePage>) -> Self {
        let base = base.trim_end_matches('/');
        let pages = site
            .into_iter()
            .map(|p| (format!("{}{}", base, p.path), p.html))
            .collect();
        Self {
            pages,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Every URL fetched so far, in request order
    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageFetcher for FixtureFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url.as_str()) {
            Some(html) => Ok(Page::new(url.clone(), html.clone())),
            None => Err(FetchError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

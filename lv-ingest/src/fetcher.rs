//! Page fetcher
//!
//! One GET per call, no retry. The body is returned as text and parsed on
//! demand with [`Page::document`], so the (non-`Send`) document tree never
//! has to live across an await point.

use crate::error::FetchError;
use async_trait::async_trait;
use lv_common::config::CrawlConfig;
use scraper::Html;
use std::time::Duration;
use url::Url;

/// Fetched HTML page
#[derive(Debug, Clone)]
pub struct Page {
    /// Final URL after redirects; relative links resolve against it
    pub url: Url,
    pub body: String,
}

impl Page {
    pub fn new(url: Url, body: impl Into<String>) -> Self {
        Self {
            url,
            body: body.into(),
        }
    }

    /// Parse the body into a queryable document tree
    pub fn document(&self) -> Html {
        Html::parse_document(&self.body)
    }
}

/// Source of pages for the crawl
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError>;
}

/// reqwest-backed fetcher
pub struct HttpFetcher {
    http_client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self, FetchError> {
        let http_client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| FetchError::Network {
                url: String::new(),
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Page, FetchError> {
        tracing::debug!(url = %url, "Fetching page");

        let response = self
            .http_client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response.text().await.map_err(|e| FetchError::Body {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!(url = %final_url, bytes = body.len(), "Fetched page");

        Ok(Page::new(final_url, body))
    }
}

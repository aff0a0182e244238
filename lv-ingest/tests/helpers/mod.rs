//! Test helpers for lv-ingest integration tests
//!
//! - `site`: a small catalog site as (path, html) pairs
//! - `FixtureFetcher`: serves a site from memory, no network

#![allow(dead_code)]

pub mod fixture_fetcher;
pub mod site;

pub use fixture_fetcher::FixtureFetcher;
pub use site::{catalog_site, FixturePage};

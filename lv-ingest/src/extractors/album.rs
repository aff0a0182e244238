//! Album page → song drafts

use super::{resolve_href, Extraction, ParseRejection, SiteSelectors};
use lv_common::{LooseNumber, SongDraft};
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;
use url::Url;

/// `label: value` pairs from an album's details block
///
/// Labels are stored lowercase without the trailing colon, so
/// `<strong>Total Songs:</strong> 6` is found under `"total songs"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlbumDetails {
    fields: HashMap<String, String>,
}

impl AlbumDetails {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.fields.get(label).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Draft for one ringtone entry sharing these details
    pub fn to_draft(&self, song_name: String, url: String) -> SongDraft {
        SongDraft {
            song_name,
            url,
            movie: self.text("movie"),
            cast_and_crew: self.get("cast and crew").map(split_names),
            music: self.text("music"),
            director: self.text("director"),
            producer: self.text("producer"),
            year: self.get("year").and_then(LooseNumber::parse),
            total_songs: self.get("total songs").and_then(LooseNumber::parse),
            language: self.text("language"),
        }
    }

    fn text(&self, label: &str) -> Option<String> {
        self.get(label)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

fn split_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read every label in the details block(s)
///
/// A value is the text following its label up to the next label or line
/// break. When a label repeats, the last occurrence wins.
pub fn extract_details(doc: &Html, selectors: &SiteSelectors) -> AlbumDetails {
    let mut details = AlbumDetails::default();

    for block in doc.select(&selectors.details_block) {
        for label in block.select(&selectors.details_label) {
            let key = normalize_label(&label.text().collect::<String>());
            if key.is_empty() {
                continue;
            }
            let value = label_value(label, selectors);
            details.fields.insert(key, value);
        }
    }

    details
}

fn normalize_label(raw: &str) -> String {
    raw.trim().trim_end_matches(':').trim().to_lowercase()
}

fn label_value(label: ElementRef<'_>, selectors: &SiteSelectors) -> String {
    let mut value = String::new();

    for sibling in label.next_siblings() {
        match sibling.value() {
            Node::Text(text) => value.push_str(text),
            Node::Element(element) => {
                let Some(child) = ElementRef::wrap(sibling) else {
                    break;
                };
                if element.name() == "br"
                    || selectors.details_label.matches(&child)
                    || child.select(&selectors.details_label).next().is_some()
                {
                    break;
                }
                value.extend(child.text());
            }
            _ => {}
        }
    }

    value.trim().trim_start_matches(':').trim().to_string()
}

/// One draft per ringtone entry, each carrying the album details
///
/// Entries without a usable download link or song name are logged and
/// reported in `rejected`; they never fail the page.
pub fn extract_songs(doc: &Html, base: &Url, selectors: &SiteSelectors) -> Extraction<SongDraft> {
    let details = extract_details(doc, selectors);
    let mut extraction = Extraction::new();

    for entry in doc.select(&selectors.ringtone_entry) {
        let song_name = entry
            .select(&selectors.song_name)
            .next()
            .map(|e| e.text().collect::<String>().trim().to_string())
            .unwrap_or_default();

        let link = match entry.select(&selectors.download_link).next() {
            Some(a) => resolve_href(a, base),
            None => Err(crate::error::ParseError::Url {
                href: String::new(),
                message: "no download link".to_string(),
            }),
        };

        let url = match link {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(page = %base, song = %song_name, error = %e, "Skipping ringtone entry");
                extraction.rejected.push(e.into());
                continue;
            }
        };

        if song_name.is_empty() {
            tracing::warn!(page = %base, url = %url, "Skipping ringtone entry without a song name");
            extraction.rejected.push(ParseRejection {
                reason: format!("no song name for {}", url),
            });
            continue;
        }

        extraction.items.push(details.to_draft(song_name, url.into()));
    }

    extraction
}

//! Data model shared by the ingest pipeline and the HTTP API
//!
//! JSON field names are camelCase (`songName`, `castAndCrew`, `totalSongs`)
//! to match the public API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number scraped from free text
///
/// Source pages are not consistent: "2014" becomes `Number(2014)`, while
/// values such as "2014-15" or "N/A" are kept verbatim as `Text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LooseNumber {
    Number(i64),
    Text(String),
}

impl LooseNumber {
    /// Parse scraped text; empty or whitespace-only input is absent
    ///
    /// # Examples
    ///
    /// ```
    /// use lv_common::LooseNumber;
    ///
    /// assert_eq!(LooseNumber::parse(" 2014 "), Some(LooseNumber::Number(2014)));
    /// assert_eq!(LooseNumber::parse("N/A"), Some(LooseNumber::Text("N/A".to_string())));
    /// assert_eq!(LooseNumber::parse("  "), None);
    /// ```
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(n) => Some(LooseNumber::Number(n)),
            Err(_) => Some(LooseNumber::Text(trimmed.to_string())),
        }
    }

    pub fn as_number(&self) -> Option<i64> {
        match self {
            LooseNumber::Number(n) => Some(*n),
            LooseNumber::Text(_) => None,
        }
    }

    /// Raw text, only for values that did not parse as a number
    pub fn as_text(&self) -> Option<&str> {
        match self {
            LooseNumber::Number(_) => None,
            LooseNumber::Text(s) => Some(s),
        }
    }

    /// Rebuild from the (number, text) column pair used in storage
    pub fn from_columns(number: Option<i64>, text: Option<String>) -> Option<Self> {
        match (number, text) {
            (Some(n), _) => Some(LooseNumber::Number(n)),
            (None, Some(t)) => Some(LooseNumber::Text(t)),
            (None, None) => None,
        }
    }
}

/// Song metadata extracted from an album page, not yet persisted
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongDraft {
    pub song_name: String,
    /// Absolute download URL
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_and_crew: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub director: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub producer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_songs: Option<LooseNumber>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

impl SongDraft {
    pub fn key(&self, field: KeyField) -> &str {
        match field {
            KeyField::SongName => &self.song_name,
            KeyField::Url => &self.url,
        }
    }
}

/// Persisted song
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SongRecord {
    pub id: Uuid,
    #[serde(flatten)]
    pub song: SongDraft,
    pub created_at: DateTime<Utc>,
}

/// Fields that are meant to be unique across the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum KeyField {
    SongName,
    Url,
}

impl KeyField {
    pub const ALL: [KeyField; 2] = [KeyField::SongName, KeyField::Url];

    /// Column holding this key in the `songs` table
    pub fn column(self) -> &'static str {
        match self {
            KeyField::SongName => "song_name",
            KeyField::Url => "url",
        }
    }
}

impl std::fmt::Display for KeyField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyField::SongName => write!(f, "songName"),
            KeyField::Url => write!(f, "url"),
        }
    }
}

/// Registered account (password material never leaves the db layer)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// A user's reference to a song, with the song expanded inline
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikedSong {
    pub id: Uuid,
    pub song: SongRecord,
    pub created_at: DateTime<Utc>,
}

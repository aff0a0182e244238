//! # lyricvault common library
//!
//! Shared code for the lyricvault services including:
//! - Configuration loading (TOML file, environment, command line)
//! - Database initialization and repositories
//! - Song, user and liked-song models
//! - Password hashing and session tokens

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;

pub use error::{Error, Result};
pub use models::{KeyField, LikedSong, LooseNumber, SongDraft, SongRecord, User};

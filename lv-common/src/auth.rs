//! Password hashing and signed session tokens
//!
//! # Pure Functions
//!
//! This module contains ONLY pure functions (plus random salt generation).
//! The HTTP middleware that reads the `Authorization` header lives in lv-api,
//! the signing secret is loaded by [`crate::db::settings::load_or_init_token_secret`].
//!
//! Passwords are stored as bcrypt strings (salt and cost embedded).
//!
//! # Token format
//!
//! `"{user_id}.{expires_at_ms}.{signature}"` where the signature is the
//! hex HMAC-SHA256 of `"{user_id}.{expires_at_ms}"` under the server secret.

use crate::Result;
use hmac::{Hmac, Mac};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// bcrypt cost used when `[auth] password_hash_cost` is not set
pub const DEFAULT_PASSWORD_COST: u32 = 10;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}$").expect("valid email regex")
});

/// Token validation failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Token expired at {expires_at_ms}")]
    Expired { expires_at_ms: i64 },
}

/// bcrypt hash as stored in the users table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a hash read back from storage
    pub fn from_stored(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Basic shape check (trimmed by the caller)
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_PATTERN.is_match(email)
}

/// Hash a password with a fresh random salt at bcrypt `cost` (4..=31)
///
/// CPU-bound; async callers should run it on a blocking thread.
pub fn hash_password(password: &str, cost: u32) -> Result<PasswordHash> {
    bcrypt::hash(password, cost)
        .map(PasswordHash)
        .map_err(|e| crate::Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Check a password against a stored hash; a corrupt hash never verifies
pub fn verify_password(password: &str, stored: &PasswordHash) -> bool {
    bcrypt::verify(password, &stored.0).unwrap_or(false)
}

/// Issue a token for `user_id` valid until `now_ms + ttl_ms` (saturating)
pub fn issue_token(user_id: Uuid, secret: &str, now_ms: i64, ttl_ms: i64) -> String {
    let payload = format!("{}.{}", user_id, now_ms.saturating_add(ttl_ms));
    let mut mac = keyed_mac(secret);
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());
    format!("{}.{}", payload, signature)
}

/// Validate signature and expiry, returning the user id
///
/// # Examples
///
/// ```
/// use lv_common::auth::{issue_token, verify_token, TokenError};
/// use uuid::Uuid;
///
/// let user = Uuid::new_v4();
/// let token = issue_token(user, "secret", 1_000, 500);
///
/// assert_eq!(verify_token(&token, "secret", 1_200), Ok(user));
/// assert_eq!(verify_token(&token, "other", 1_200), Err(TokenError::InvalidSignature));
/// assert!(matches!(verify_token(&token, "secret", 1_600), Err(TokenError::Expired { .. })));
/// ```
pub fn verify_token(token: &str, secret: &str, now_ms: i64) -> std::result::Result<Uuid, TokenError> {
    let (payload, signature) = token.rsplit_once('.').ok_or(TokenError::Malformed)?;
    let (user_part, expires_part) = payload.split_once('.').ok_or(TokenError::Malformed)?;

    let signature = hex::decode(signature).map_err(|_| TokenError::InvalidSignature)?;
    let mut mac = keyed_mac(secret);
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::InvalidSignature)?;

    let user_id = Uuid::parse_str(user_part).map_err(|_| TokenError::Malformed)?;
    let expires_at_ms: i64 = expires_part.parse().map_err(|_| TokenError::Malformed)?;

    if now_ms >= expires_at_ms {
        return Err(TokenError::Expired { expires_at_ms });
    }

    Ok(user_id)
}

fn keyed_mac(secret: &str) -> HmacSha256 {
    HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length")
}

/// Generate a random signing secret (64 hex chars)
pub fn generate_secret() -> String {
    let bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(bytes)
}

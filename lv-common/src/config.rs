//! Configuration loading
//!
//! Priority order (highest first):
//! 1. Command-line argument (applied by the binaries via [`Overrides`])
//! 2. Environment variable (clap `env = ...` on the same arguments)
//! 3. TOML config file
//! 4. Compiled default
//!
//! A missing TOML file is not an error: a warning is logged and the
//! compiled defaults are used.

use crate::{Error, Result};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "LYRICVAULT_CONFIG";

/// Top-level configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub selectors: SelectorConfig,

    #[serde(default)]
    pub schedule: ScheduleConfig,

    #[serde(default)]
    pub auth: AuthConfig,

    #[serde(default)]
    pub api: ApiConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
            crawl: CrawlConfig::default(),
            selectors: SelectorConfig::default(),
            schedule: ScheduleConfig::default(),
            auth: AuthConfig::default(),
            api: ApiConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); RUST_LOG wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// What to do with a batch that collides with known songs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Drop the whole batch, leave duplicates to the reconciler
    #[default]
    DropBatch,
    /// Insert only the records that do not collide
    SkipRecord,
}

/// Year pages generated from a URL template instead of the catalog index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearRangeSeed {
    pub from: i32,
    pub to: i32,
    /// Must contain `{year}`
    pub url_template: String,
}

impl YearRangeSeed {
    /// Expand the template over the inclusive range, oldest first
    pub fn urls(&self) -> Vec<String> {
        (self.from..=self.to)
            .map(|year| self.url_template.replace("{year}", &year.to_string()))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Catalog root listing the per-year pages
    #[serde(default = "default_catalog_url")]
    pub catalog_url: String,

    /// Worker-pool ceiling for each traversal level
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default)]
    pub conflict_policy: ConflictPolicy,

    /// When set, the crawl starts from these year pages and skips the index
    #[serde(default)]
    pub year_range: Option<YearRangeSeed>,

    /// Upper bound on the page count a year page may advertise
    #[serde(default = "default_max_pages_per_year")]
    pub max_pages_per_year: u32,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            catalog_url: default_catalog_url(),
            max_concurrency: default_max_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
            conflict_policy: ConflictPolicy::default(),
            year_range: None,
            max_pages_per_year: default_max_pages_per_year(),
        }
    }
}

/// CSS selectors for the three page shapes of the catalog site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Year links on the catalog root
    pub year_links: String,
    /// Numbered pagination controls on a year page
    pub pagination_links: String,
    /// Album thumbnails on a listing page
    pub album_links: String,
    /// Labeled details block on an album page
    pub details_block: String,
    /// Label element inside the details block
    pub details_label: String,
    /// One ringtone/download entry on an album page
    pub ringtone_entry: String,
    pub song_name: String,
    pub download_link: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            year_links: "#block-8 > ul > li > a".to_string(),
            pagination_links: ".page-pagination a".to_string(),
            album_links: ".post-thumbnail a".to_string(),
            details_block: ".has-text-align-left".to_string(),
            details_label: "strong".to_string(),
            ringtone_entry: ".ringtones".to_string(),
            song_name: ".songname".to_string(),
            download_link: ".downloadinfo > a".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Run the daily triggers inside lv-api
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Local "HH:MM" start of the daily crawl
    #[serde(default = "default_crawl_at")]
    pub crawl_at: String,

    /// Random delay added to each crawl start, 0 for a fixed time
    #[serde(default)]
    pub crawl_jitter_minutes: u32,

    /// Local "HH:MM" start of the daily reconciliation
    #[serde(default = "default_reconcile_at")]
    pub reconcile_at: String,

    /// Offset of the schedule's local time from UTC
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            crawl_at: default_crawl_at(),
            crawl_jitter_minutes: 0,
            reconcile_at: default_reconcile_at(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

impl ScheduleConfig {
    pub fn crawl_time(&self) -> Result<NaiveTime> {
        parse_clock_time("schedule.crawl_at", &self.crawl_at)
    }

    pub fn reconcile_time(&self) -> Result<NaiveTime> {
        parse_clock_time("schedule.reconcile_at", &self.reconcile_at)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default = "default_token_ttl_hours")]
    pub token_ttl_hours: u64,

    /// Token signing secret; generated and kept in the settings table if absent
    #[serde(default)]
    pub token_secret: Option<String>,

    /// bcrypt work factor for stored passwords
    #[serde(default = "default_password_hash_cost")]
    pub password_hash_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: default_token_ttl_hours(),
            token_secret: None,
            password_hash_cost: default_password_hash_cost(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Maximum rows returned by /api/search-songs
    #[serde(default = "default_search_limit")]
    pub search_limit: i64,
    #[serde(default = "default_page_size")]
    pub default_page_size: i64,
    #[serde(default = "default_max_page_size")]
    pub max_page_size: i64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            search_limit: default_search_limit(),
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
}

impl AppConfig {
    /// Load configuration from an explicit path or the default locations
    ///
    /// An explicit path that does not exist is an error; a missing
    /// default file falls back to compiled defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(Error::Config(format!(
                        "Config file not found: {}",
                        path.display()
                    )));
                }
                Self::from_file(path)?
            }
            None => match default_config_file() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                Some(path) => {
                    warn!(
                        "No config file at {}, using built-in defaults",
                        path.display()
                    );
                    Self::default()
                }
                None => {
                    warn!("Could not determine config directory, using built-in defaults");
                    Self::default()
                }
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))
    }

    /// Apply command-line / environment values on top of the file
    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(path) = overrides.database_path {
            self.database_path = path;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(level) = overrides.log_level {
            self.logging.level = level;
        }
    }

    /// Reject values that would only fail later at runtime
    pub fn validate(&self) -> Result<()> {
        if self.crawl.max_concurrency == 0 {
            return Err(Error::Config(
                "crawl.max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.crawl.max_pages_per_year == 0 {
            return Err(Error::Config(
                "crawl.max_pages_per_year must be at least 1".to_string(),
            ));
        }
        if let Some(range) = &self.crawl.year_range {
            if range.from > range.to {
                return Err(Error::Config(format!(
                    "crawl.year_range: from ({}) is after to ({})",
                    range.from, range.to
                )));
            }
            if !range.url_template.contains("{year}") {
                return Err(Error::Config(
                    "crawl.year_range.url_template must contain {year}".to_string(),
                ));
            }
        }
        if self.api.default_page_size < 1 || self.api.max_page_size < self.api.default_page_size
        {
            return Err(Error::Config(
                "api.default_page_size must be between 1 and api.max_page_size".to_string(),
            ));
        }
        if self.schedule.utc_offset_minutes.unsigned_abs() >= MINUTES_PER_DAY {
            return Err(Error::Config(format!(
                "schedule.utc_offset_minutes = {} is not within a day of UTC",
                self.schedule.utc_offset_minutes
            )));
        }
        if !PASSWORD_COST_RANGE.contains(&self.auth.password_hash_cost) {
            return Err(Error::Config(format!(
                "auth.password_hash_cost must be between {} and {}",
                PASSWORD_COST_RANGE.start(),
                PASSWORD_COST_RANGE.end()
            )));
        }
        self.schedule.crawl_time()?;
        self.schedule.reconcile_time()?;
        Ok(())
    }
}

/// Page cap applied when `crawl.max_pages_per_year` is not set
pub const DEFAULT_MAX_PAGES_PER_YEAR: u32 = 500;

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Work factors bcrypt accepts
const PASSWORD_COST_RANGE: std::ops::RangeInclusive<u32> = 4..=31;

fn parse_clock_time(key: &str, value: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%H:%M")
        .map_err(|e| Error::Config(format!("{} = {:?} is not HH:MM: {}", key, value, e)))
}

/// `$LYRICVAULT_CONFIG`, else `<config_dir>/lyricvault/config.toml`
fn default_config_file() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("lyricvault").join("config.toml"))
}

fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("lyricvault"))
        .unwrap_or_else(|| PathBuf::from("./lyricvault_data"))
        .join("lyricvault.db")
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_catalog_url() -> String {
    "https://isaiminisong.com/songs".to_string()
}

fn default_max_concurrency() -> usize {
    8
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("lyricvault/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_max_pages_per_year() -> u32 {
    DEFAULT_MAX_PAGES_PER_YEAR
}

fn default_true() -> bool {
    true
}

fn default_crawl_at() -> String {
    "06:00".to_string()
}

fn default_reconcile_at() -> String {
    "07:00".to_string()
}

fn default_utc_offset_minutes() -> i32 {
    330
}

fn default_token_ttl_hours() -> u64 {
    24
}

fn default_password_hash_cost() -> u32 {
    crate::auth::DEFAULT_PASSWORD_COST
}

fn default_search_limit() -> i64 {
    100
}

fn default_page_size() -> i64 {
    10
}

fn default_max_page_size() -> i64 {
    100
}

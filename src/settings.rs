// src/settings.rs

//! Runtime settings.
//!
//! The CLI loads settings from a TOML file (falling back to defaults),
//! the Lambda binaries from environment variables. Key-space layout,
//! feed endpoint, page budget and the invalidation heuristic knobs all
//! live here so that every entry point shares one configuration shape.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Blob store key-space layout
    #[serde(default)]
    pub storage: StorageSettings,

    /// Status feed endpoint and collection budget
    #[serde(default)]
    pub feed: FeedSettings,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpSettings,

    /// CDN edge cache invalidation knobs
    #[serde(default)]
    pub edge: EdgeSettings,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load settings or return defaults if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!(
                "Settings load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Build settings from environment variables (Lambda environment).
    ///
    /// Unset variables fall back to the same defaults the TOML loader uses.
    pub fn from_env() -> Self {
        fn var(name: &str) -> Option<String> {
            std::env::var(name).ok().filter(|v| !v.is_empty())
        }

        let mut settings = Self::default();

        if let Some(v) = var("S3_BUCKET") {
            settings.storage.bucket = v;
        }
        if let Some(v) = var("OUTPUT_DIR") {
            settings.storage.output_dir = v;
        }
        if let Some(v) = var("POST_LOG_DIR") {
            settings.storage.post_log_dir = v;
        }
        if let Some(v) = var("SETTINGS_DIR") {
            settings.storage.settings_dir = v;
        }
        if let Some(v) = var("FEED_BASE_URL") {
            settings.feed.base_url = v;
        }
        if let Some(v) = var("FEED_TOKEN") {
            settings.feed.token = v;
        }
        if let Some(v) = var("FEED_QUERY") {
            settings.feed.query = v;
        }
        if let Some(v) = var("FEED_MAX_PAGES").and_then(|v| v.parse().ok()) {
            settings.feed.max_pages = v;
        }
        if let Some(v) = var("HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            settings.http.timeout_secs = v;
        }
        if let Some(v) = var("CLOUDFRONT_DISTRIBUTION_ID") {
            settings.edge.distribution_id = v;
        }
        if let Some(v) = var("INVALIDATION_MIN_BYTES").and_then(|v| v.parse().ok()) {
            settings.edge.min_bytes = v;
        }

        settings
    }

    /// Validate settings values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::config("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::config("http.timeout_secs must be > 0"));
        }
        if self.feed.max_pages == 0 {
            return Err(AppError::config("feed.max_pages must be > 0"));
        }
        if self.feed.page_size == 0 {
            return Err(AppError::config("feed.page_size must be > 0"));
        }
        if self.storage.output_dir.trim().is_empty() {
            return Err(AppError::config("storage.output_dir is empty"));
        }
        Ok(())
    }

    /// Blob key of the feed cursor object.
    pub fn cursor_key(&self) -> String {
        format!("{}/latest_post_id", self.storage.settings_dir)
    }

    /// Blob key of the excluded-authors object.
    pub fn exclusions_key(&self) -> String {
        format!("{}/excluded_authors.json", self.storage.settings_dir)
    }

    /// Base path of one output axis (`date`, `user`, `quest`, `month`, `errors`).
    pub fn output_base(&self, axis: &str) -> String {
        format!("{}/{}", self.storage.output_dir, axis)
    }
}

/// Blob store key-space layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    /// S3 bucket name (unused by local storage)
    #[serde(default)]
    pub bucket: String,

    /// Prefix for rendered artifact sets
    #[serde(default = "defaults::output_dir")]
    pub output_dir: String,

    /// Prefix for the raw post log
    #[serde(default = "defaults::post_log_dir")]
    pub post_log_dir: String,

    /// Prefix for checkpoint and exclusion objects
    #[serde(default = "defaults::settings_dir")]
    pub settings_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            output_dir: defaults::output_dir(),
            post_log_dir: defaults::post_log_dir(),
            settings_dir: defaults::settings_dir(),
        }
    }
}

/// Status feed endpoint and collection budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedSettings {
    /// Base URL of the status feed API
    #[serde(default = "defaults::feed_base_url")]
    pub base_url: String,

    /// Bearer token for the feed API
    #[serde(default)]
    pub token: String,

    /// Search query selecting run-report posts
    #[serde(default = "defaults::feed_query")]
    pub query: String,

    /// Posts per search page
    #[serde(default = "defaults::page_size")]
    pub page_size: usize,

    /// Page-fetch budget per scheduled run. Caps worst-case latency and
    /// cost per invocation; completeness comes from the next run.
    #[serde(default = "defaults::max_pages")]
    pub max_pages: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self {
            base_url: defaults::feed_base_url(),
            token: String::new(),
            query: defaults::feed_query(),
            page_size: defaults::page_size(),
            max_pages: defaults::max_pages(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

/// CDN edge cache invalidation knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeSettings {
    /// CloudFront distribution id (empty disables invalidation)
    #[serde(default)]
    pub distribution_id: String,

    /// Minimum object size considered a real rendered page. Blank pages
    /// weigh around 455 bytes and rendered error pages around 624, so the
    /// threshold sits between the two.
    #[serde(default = "defaults::min_bytes")]
    pub min_bytes: u64,

    /// Caller-reference prefix for invalidation requests
    #[serde(default = "defaults::caller_prefix")]
    pub caller_prefix: String,
}

impl Default for EdgeSettings {
    fn default() -> Self {
        Self {
            distribution_id: String::new(),
            min_bytes: defaults::min_bytes(),
            caller_prefix: defaults::caller_prefix(),
        }
    }
}

mod defaults {
    pub fn output_dir() -> String {
        "out".to_string()
    }

    pub fn post_log_dir() -> String {
        "posts".to_string()
    }

    pub fn settings_dir() -> String {
        "settings".to_string()
    }

    pub fn feed_base_url() -> String {
        "https://feed.example.com/api".to_string()
    }

    pub fn feed_query() -> String {
        "#run-report".to_string()
    }

    pub fn page_size() -> usize {
        100
    }

    pub fn max_pages() -> usize {
        5
    }

    pub fn user_agent() -> String {
        format!("gleaner/{}", env!("CARGO_PKG_VERSION"))
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn min_bytes() -> u64 {
        600
    }

    pub fn caller_prefix() -> String {
        "gleaner".to_string()
    }
}

//! Sentinel configuration

use anyhow::Result;
use serde::Deserialize;

/// Sentinel configuration
///
/// Every field can be set through the environment with the `SENTINEL`
/// prefix, e.g. `SENTINEL_KEYWORD=awsoutage`.
#[derive(Debug, Clone, Deserialize)]
pub struct SentinelConfig {
    /// Keyword the search matches
    #[serde(default = "default_keyword")]
    pub keyword: String,

    /// Recent-search API endpoint
    #[serde(default = "default_search_endpoint")]
    pub search_endpoint: String,

    /// Bearer token for the search API
    #[serde(default)]
    pub bearer_token: String,

    /// Ingestion lookback window in hours
    #[serde(default = "default_lookback_hours")]
    pub lookback_hours: u64,

    /// Search results requested per page
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Detection scan window in hours
    #[serde(default = "default_window_hours")]
    pub window_hours: u64,

    /// Detection bin width in seconds
    #[serde(default = "default_bin_seconds")]
    pub bin_seconds: i64,

    /// Dispersion threshold that marks the window anomalous
    #[serde(default = "default_std_dev_threshold")]
    pub std_dev_threshold: f64,

    /// Minimum hours between notifications
    #[serde(default = "default_cooldown_hours")]
    pub cooldown_hours: u64,

    /// Path of the event store file
    #[serde(default = "default_events_path")]
    pub events_path: String,

    /// Path of the checkpoint file
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: String,

    /// Optional webhook subscribed to alerts
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_keyword() -> String {
    "awsoutage".to_string()
}

fn default_search_endpoint() -> String {
    "https://api.twitter.com/2/tweets/search/recent".to_string()
}

fn default_lookback_hours() -> u64 {
    1
}

fn default_page_size() -> u32 {
    100
}

fn default_window_hours() -> u64 {
    6
}

fn default_bin_seconds() -> i64 {
    3600
}

fn default_std_dev_threshold() -> f64 {
    100.0
}

fn default_cooldown_hours() -> u64 {
    5
}

fn default_events_path() -> String {
    "data/events.json".to_string()
}

fn default_checkpoint_path() -> String {
    "data/checkpoint.json".to_string()
}

impl Default for SentinelConfig {
    fn default() -> Self {
        Self {
            keyword: default_keyword(),
            search_endpoint: default_search_endpoint(),
            bearer_token: String::new(),
            lookback_hours: default_lookback_hours(),
            page_size: default_page_size(),
            window_hours: default_window_hours(),
            bin_seconds: default_bin_seconds(),
            std_dev_threshold: default_std_dev_threshold(),
            cooldown_hours: default_cooldown_hours(),
            events_path: default_events_path(),
            checkpoint_path: default_checkpoint_path(),
            webhook_url: None,
        }
    }
}

impl SentinelConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SENTINEL"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }
}

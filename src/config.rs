//! Configuration and settings management
//!
//! Loads settings from environment variables and optional config files,
//! and defines feed constants.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Application settings loaded from environment variables
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Telegram Bot API token, also used to resolve media files
    pub bot_token: Option<String>,

    /// Telegram user ID of the administrator
    #[serde(default)]
    pub admin_id: i64,

    /// Public base URL used to build media links in the feed API
    pub public_base_url: Option<String>,

    /// PostgreSQL connection string. Absence selects the SQLite backend.
    pub database_url: Option<String>,

    /// Path of the embedded SQLite database file
    #[serde(default = "default_sqlite_path")]
    pub sqlite_path: String,

    /// Listen address of the public HTTP API
    #[serde(default = "default_api_bind_addr")]
    pub api_bind_addr: String,

    /// Base URL of the Telegram Bot API
    #[serde(default = "default_telegram_api_url")]
    pub telegram_api_url: String,
}

fn default_sqlite_path() -> String {
    "news.db".to_string()
}

fn default_api_bind_addr() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_telegram_api_url() -> String {
    "https://api.telegram.org".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_token: None,
            admin_id: 0,
            public_base_url: None,
            database_url: None,
            sqlite_path: default_sqlite_path(),
            api_bind_addr: default_api_bind_addr(),
            telegram_api_url: default_telegram_api_url(),
        }
    }
}

/// Build the layered configuration source.
///
/// # Errors
///
/// Returns a `ConfigError` if a source cannot be read.
pub fn build_config() -> Result<Config, ConfigError> {
    let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

    Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(File::with_name(&format!("config/{run_mode}")).required(false))
        // Not checked into git
        .add_source(File::with_name("config/local").required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        // UPPER_SNAKE_CASE is mapped to snake_case; empty vars count as unset
        .add_source(Environment::default().ignore_empty(true))
        .build()
}

impl Settings {
    /// Create new settings by loading from environment and files
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use newsfeed_bot::config::Settings;
    ///
    /// let settings = Settings::new().expect("Failed to load configuration");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if loading fails.
    pub fn new() -> Result<Self, ConfigError> {
        let mut settings: Self = build_config()?.try_deserialize()?;

        // Fallback for environments where the automatic mapping misses the key
        if settings.database_url.is_none() {
            if let Ok(val) = std::env::var("DATABASE_URL") {
                if !val.is_empty() {
                    settings.database_url = Some(val);
                }
            }
        }
        if settings.bot_token.is_none() {
            if let Ok(val) = std::env::var("BOT_TOKEN") {
                if !val.is_empty() {
                    settings.bot_token = Some(val);
                }
            }
        }

        Ok(settings)
    }

    /// Returns the bot token if one is configured and non-blank
    #[must_use]
    pub fn bot_token(&self) -> Option<&str> {
        non_blank(self.bot_token.as_deref())
    }

    /// Returns the PostgreSQL connection string if one is configured
    #[must_use]
    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_deref())
    }

    /// Returns the public base URL without a trailing slash.
    /// An unset base URL yields an empty string (relative links).
    #[must_use]
    pub fn public_base_url(&self) -> String {
        non_blank(self.public_base_url.as_deref())
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_default()
    }

    /// Returns true if the given Telegram user is the administrator
    #[must_use]
    pub const fn is_admin(&self, user_id: i64) -> bool {
        self.admin_id != 0 && self.admin_id == user_id
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Maximum number of items returned by the public feed endpoint
pub const FEED_API_LIMIT: usize = 50;
/// Number of items shown by the "show feed" chat action
pub const CHAT_FEED_LIMIT: usize = 10;

/// Timeout for the media metadata lookup (`getFile`)
pub const MEDIA_LOOKUP_TIMEOUT_SECS: u64 = 20;
/// Timeout for the media content download
pub const MEDIA_FETCH_TIMEOUT_SECS: u64 = 30;
/// Browser/intermediary cache lifetime for proxied media
pub const MEDIA_CACHE_MAX_AGE_SECS: u64 = 86_400;

/// Maximum message length for Telegram with a safety margin for markup
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4000;

// Telegram API retry configuration
/// Maximum attempts for a Telegram send
pub const TELEGRAM_API_MAX_RETRIES: usize = 3;
/// Initial backoff between Telegram retries
pub const TELEGRAM_API_INITIAL_BACKOFF_MS: u64 = 500;
/// Upper bound for the Telegram retry backoff
pub const TELEGRAM_API_MAX_BACKOFF_MS: u64 = 4000;

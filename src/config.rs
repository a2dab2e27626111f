//! Runtime settings.
//!
//! [`CoreSettings`] can be built from defaults, a JSON document or `NEARBY_*`
//! environment variables.

use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::discovery::DEFAULT_ONLINE_THRESHOLD_SECS;
use crate::social::{DEFAULT_ALERT_PAGE_SIZE, DEFAULT_MAX_ALERT_PAGE_SIZE};

/// Error type for loading settings.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable held a value that doesn't parse.
    #[error("Invalid value for {key}: {value}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },

    /// The settings are inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The JSON document is malformed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Result type alias for configuration.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Settings for the whole core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreSettings {
    /// A user is online if their last activity is at most this many seconds
    /// old.
    pub online_threshold_secs: i64,
    /// Also hide users the actor blocked from the actor's own lists.
    pub symmetric_block_exclusion: bool,
    /// Alerts per page when the caller doesn't ask for a size.
    pub alert_page_size: u32,
    /// Upper bound on a requested page size.
    pub max_alert_page_size: u32,
    /// `SQLite` database file.
    pub database_path: PathBuf,
    /// Default log filter, used when `RUST_LOG` is unset.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,
}

impl Default for CoreSettings {
    fn default() -> Self {
        Self {
            online_threshold_secs: DEFAULT_ONLINE_THRESHOLD_SECS,
            symmetric_block_exclusion: false,
            alert_page_size: DEFAULT_ALERT_PAGE_SIZE,
            max_alert_page_size: DEFAULT_MAX_ALERT_PAGE_SIZE,
            database_path: PathBuf::from("nearby.db"),
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

impl CoreSettings {
    /// Loads settings from `NEARBY_*` environment variables.
    ///
    /// Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidValue` if a variable is set but doesn't parse, or
    /// `Invalid` if the result fails [`validate`](Self::validate).
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads settings through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`from_env`](Self::from_env).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let settings = Self {
            online_threshold_secs: parse_var(
                &lookup,
                "NEARBY_ONLINE_THRESHOLD_SECS",
                defaults.online_threshold_secs,
            )?,
            symmetric_block_exclusion: bool_var(
                &lookup,
                "NEARBY_SYMMETRIC_BLOCK_EXCLUSION",
                defaults.symmetric_block_exclusion,
            )?,
            alert_page_size: parse_var(&lookup, "NEARBY_ALERT_PAGE_SIZE", defaults.alert_page_size)?,
            max_alert_page_size: parse_var(
                &lookup,
                "NEARBY_MAX_ALERT_PAGE_SIZE",
                defaults.max_alert_page_size,
            )?,
            database_path: lookup("NEARBY_DATABASE_PATH")
                .map_or(defaults.database_path, PathBuf::from),
            log_level: lookup("NEARBY_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logs: bool_var(&lookup, "NEARBY_JSON_LOGS", defaults.json_logs)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from JSON. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `Parse` for malformed JSON or `Invalid` if the result fails
    /// [`validate`](Self::validate).
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Serializes settings to JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Checks the settings for consistency.
    ///
    /// # Errors
    ///
    /// Returns `Invalid` for a non-positive online threshold, a zero page
    /// size, or a default page size above the maximum.
    pub fn validate(&self) -> Result<()> {
        if self.online_threshold_secs <= 0 {
            return Err(ConfigError::Invalid(format!(
                "online_threshold_secs must be positive, got {}",
                self.online_threshold_secs
            )));
        }
        if self.alert_page_size == 0 || self.max_alert_page_size == 0 {
            return Err(ConfigError::Invalid(
                "alert page sizes must be positive".to_string(),
            ));
        }
        if self.alert_page_size > self.max_alert_page_size {
            return Err(ConfigError::Invalid(format!(
                "alert_page_size {} exceeds max_alert_page_size {}",
                self.alert_page_size, self.max_alert_page_size
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
    }
}

fn bool_var<F>(lookup: &F, key: &str, default: bool) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                value,
            }),
        },
    }
}

//! Service configuration read from the process environment.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::LogFormat;

/// Environment variable holding the `PostgreSQL` connection URL.
pub const DATABASE_URL_VAR: &str = "RELEASE_LEDGER_DATABASE_URL";
/// Environment variable holding the connection pool size.
pub const POOL_SIZE_VAR: &str = "RELEASE_LEDGER_POOL_SIZE";
/// Environment variable selecting `pretty` or `json` log output.
pub const LOG_FORMAT_VAR: &str = "RELEASE_LEDGER_LOG_FORMAT";
/// Environment variable holding the default listing page size.
pub const PAGE_SIZE_VAR: &str = "RELEASE_LEDGER_PAGE_SIZE";

const DEFAULT_POOL_SIZE: u32 = 10;
const DEFAULT_PAGE_SIZE: u32 = 50;
const MAX_PAGE_SIZE: u32 = 500;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed.
    #[error("{name} is invalid: {message}")]
    InvalidValue {
        /// Variable name.
        name: &'static str,
        /// Parse failure description.
        message: String,
    },
    /// A required variable is not set.
    #[error("{0} must be set")]
    Missing(&'static str),
}

/// Configuration for the release ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// `PostgreSQL` connection URL; only needed for the `PostgreSQL` adapters.
    #[serde(default)]
    pub database_url: Option<String>,

    /// Maximum number of pooled database connections.
    pub pool_size: u32,

    /// Log output format.
    #[serde(default)]
    pub log_format: LogFormat,

    /// Page size used when a listing request does not specify one.
    pub default_page_size: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            pool_size: DEFAULT_POOL_SIZE,
            log_format: LogFormat::default(),
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables, falling back to
    /// defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is present but
    /// cannot be parsed or is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable is present but
    /// cannot be parsed or is out of range.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let read = |name: &str| non_blank(lookup(name));

        config.database_url = read(DATABASE_URL_VAR);

        if let Some(raw) = read(POOL_SIZE_VAR) {
            config.pool_size = parse_bounded(POOL_SIZE_VAR, &raw, u32::MAX)?;
        }
        if let Some(raw) = read(PAGE_SIZE_VAR) {
            config.default_page_size = parse_bounded(PAGE_SIZE_VAR, &raw, MAX_PAGE_SIZE)?;
        }
        if let Some(raw) = read(LOG_FORMAT_VAR) {
            config.log_format = parse_log_format(&raw)?;
        }

        Ok(config)
    }

    /// Returns the database URL or reports it missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when no database URL is configured.
    pub fn require_database_url(&self) -> Result<&str, ConfigError> {
        self.database_url
            .as_deref()
            .ok_or(ConfigError::Missing(DATABASE_URL_VAR))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|raw| {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_owned())
        }
    })
}

fn parse_bounded(name: &'static str, raw: &str, max: u32) -> Result<u32, ConfigError> {
    let value = raw.parse::<u32>().map_err(|err| ConfigError::InvalidValue {
        name,
        message: err.to_string(),
    })?;
    if value == 0 || value > max {
        return Err(ConfigError::InvalidValue {
            name,
            message: format!("expected a value between 1 and {max}, got {value}"),
        });
    }
    Ok(value)
}

fn parse_log_format(raw: &str) -> Result<LogFormat, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "json" => Ok(LogFormat::Json),
        "pretty" => Ok(LogFormat::Pretty),
        other => Err(ConfigError::InvalidValue {
            name: LOG_FORMAT_VAR,
            message: format!("unknown log format '{other}', expected pretty or json"),
        }),
    }
}

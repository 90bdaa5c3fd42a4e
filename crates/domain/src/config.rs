//! Environment-driven configuration structures shared by all crates.

use std::{env, time::Duration};

use thiserror::Error;

/// Default delay before a surfaced error message clears itself.
pub const DEFAULT_ERROR_CLEAR_DELAY: Duration = Duration::from_millis(6_000);

/// Default upper bound for a single registry request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(10_000);

/// Where the registry backend lives and how long to wait for it. `ARIES_API`
/// is the same origin the browser dev proxy forwarded `/api/*` to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    api_base_url: String,
    request_timeout: Duration,
}

impl GatewayConfig {
    /// Loads only the environment variables required to reach the backend.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            api_base_url: get_required_var("ARIES_API")?,
            request_timeout: get_optional_millis("ARIES_REQUEST_TIMEOUT_MS")?
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        })
    }

    pub fn new(api_base_url: impl Into<String>, request_timeout: Duration) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            request_timeout,
        }
    }

    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }
}

/// Knobs for the in-memory service store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    error_clear_delay: Duration,
}

impl StoreConfig {
    /// Reads `ARIES_ERROR_CLEAR_MS`, falling back to the six second default.
    pub fn load_from_env() -> Result<Self, ConfigError> {
        hydrate_env_file()?;

        Ok(Self {
            error_clear_delay: get_optional_millis("ARIES_ERROR_CLEAR_MS")?
                .unwrap_or(DEFAULT_ERROR_CLEAR_DELAY),
        })
    }

    pub fn with_error_clear_delay(error_clear_delay: Duration) -> Self {
        Self { error_clear_delay }
    }

    pub fn error_clear_delay(&self) -> Duration {
        self.error_clear_delay
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::with_error_clear_delay(DEFAULT_ERROR_CLEAR_DELAY)
    }
}

fn get_required_var(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                Err(ConfigError::MissingVar { key })
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(_) => Err(ConfigError::MissingVar { key }),
    }
}

fn get_optional_var(key: &'static str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn get_optional_millis(key: &'static str) -> Result<Option<Duration>, ConfigError> {
    get_optional_var(key)
        .map(|raw| {
            raw.parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|source| ConfigError::InvalidNumber { key, source })
        })
        .transpose()
}

pub fn hydrate_env_file() -> Result<(), ConfigError> {
    if env::var_os("ARIES_SKIP_DOTENV").is_some() {
        return Ok(());
    }
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(dotenvy::Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(ConfigError::Dotenv { source: err }),
    }

    Ok(())
}

/// Errors emitted when `.env` hydration or environment parsing fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable `{key}`")]
    MissingVar { key: &'static str },
    #[error("invalid integer in `{key}`: {source}")]
    InvalidNumber {
        key: &'static str,
        #[source]
        source: std::num::ParseIntError,
    },
    #[error("failed to load .env file: {source}")]
    Dotenv {
        #[from]
        source: dotenvy::Error,
    },
}

//! API credentials and HTTP client settings from environment variables.

use crate::domain::errors::{ExchangeError, ExchangeResult};
use std::env;
use std::fmt;

/// API key pair of one account. Empty strings mean "not configured".
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    pub api_key: String,
    pub secret: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            secret: secret.into(),
        }
    }

    /// Reads `<PREFIX>_API_KEY` and `<PREFIX>_SECRET`, e.g. `BITSO_API_KEY`.
    pub fn from_env(prefix: &str) -> Self {
        let prefix = prefix.to_uppercase();
        Self {
            api_key: env::var(format!("{}_API_KEY", prefix)).unwrap_or_default(),
            secret: env::var(format!("{}_SECRET", prefix)).unwrap_or_default(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.secret.is_empty()
    }

    /// Fails with [`ExchangeError::MissingCredentials`] unless both parts are set.
    pub fn require(&self, exchange: &str) -> ExchangeResult<(&str, &str)> {
        if self.api_key.is_empty() {
            return Err(ExchangeError::MissingCredentials {
                exchange: exchange.to_string(),
                field: "apiKey",
            });
        }
        if self.secret.is_empty() {
            return Err(ExchangeError::MissingCredentials {
                exchange: exchange.to_string(),
                field: "secret",
            });
        }
        Ok((&self.api_key, &self.secret))
    }
}

/// Settings for the shared HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            connect_timeout_secs: 10,
            max_retries: 3,
        }
    }
}

impl HttpSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            timeout_secs: env::var("UNITRADE_HTTP_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.timeout_secs),
            connect_timeout_secs: env::var("UNITRADE_HTTP_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(defaults.connect_timeout_secs),
            max_retries: env::var("UNITRADE_HTTP_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(defaults.max_retries),
        }
    }
}

//! Typed configuration resolved once at start-up.
//!
//! # Design
//! - All environment reads happen in [`PlainConfig::from_lookup`]; the rest of
//!   the workspace receives the resolved struct explicitly.
//! - The lookup is injectable so tests never mutate process environment.

use std::fmt::{self, Debug, Formatter};
use std::time::Duration;

use tracing::debug;
use url::Url;

use crate::defaults::{
    DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS, ENV_API_KEY, ENV_API_URL, ENV_HTTP_TIMEOUT_SECS,
};
use crate::error::{ConfigError, ConfigResult};

/// API key used to authenticate against the indexing service.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Raw key material, for building the `Authorization` header.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str("ApiKey(<redacted>)")
    }
}

/// Resolved process configuration shared by every CLI command.
#[derive(Debug, Clone)]
pub struct PlainConfig {
    /// Credential sent as a bearer token.
    pub api_key: ApiKey,
    /// GraphQL endpoint of the indexing service.
    pub api_url: Url,
    /// True when `PLAIN_API_URL` supplied the endpoint.
    pub api_url_overridden: bool,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

impl PlainConfig {
    /// Build configuration from the process environment.
    ///
    /// # Errors
    ///
    /// See [`PlainConfig::from_lookup`].
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingApiKey`] when `PLAIN_API_KEY` is absent or
    /// blank, and an invalid-value error when an override cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(ENV_API_KEY)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(ApiKey)
            .ok_or(ConfigError::MissingApiKey {
                variable: ENV_API_KEY,
            })?;

        let override_url = lookup(ENV_API_URL).filter(|raw| !raw.trim().is_empty());
        let api_url_overridden = override_url.is_some();
        let api_url = parse_api_url(override_url.as_deref().unwrap_or(DEFAULT_API_URL))?;

        let timeout = match lookup(ENV_HTTP_TIMEOUT_SECS) {
            Some(raw) => parse_timeout(&raw)?,
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        debug!(
            api_url = %api_url,
            api_url_overridden,
            timeout_secs = timeout.as_secs(),
            "configuration resolved"
        );

        Ok(Self {
            api_key,
            api_url,
            api_url_overridden,
            timeout,
        })
    }
}

fn parse_api_url(raw: &str) -> ConfigResult<Url> {
    Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidApiUrl {
        variable: ENV_API_URL,
        value: raw.to_string(),
        source,
    })
}

fn parse_timeout(raw: &str) -> ConfigResult<Duration> {
    let invalid = |reason| ConfigError::InvalidTimeout {
        variable: ENV_HTTP_TIMEOUT_SECS,
        value: raw.to_string(),
        reason,
    };
    let secs = raw
        .trim()
        .parse::<u64>()
        .map_err(|_| invalid("not an integer"))?;
    if secs == 0 {
        return Err(invalid("must be positive"));
    }
    Ok(Duration::from_secs(secs))
}

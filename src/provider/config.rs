// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint configuration

use std::time::Duration;

use url::Url;

use crate::config::constants::{DEFAULT_RPC_TIMEOUT, RPC_URL_ENV};
use crate::errors::ConfigError;
use crate::transport::DEFAULT_MAX_RETRIES;

/// Configuration for the JSON-RPC endpoint
///
/// # Example
///
/// ```rust
/// use blockspan::ProviderConfig;
/// use std::time::Duration;
///
/// let config = ProviderConfig::new("https://eth-mainnet.g.alchemy.com/v2/demo")?
///     .with_rate_limit(10)
///     .with_timeout(Duration::from_secs(10));
/// assert!(config.has_rate_limiting());
/// # Ok::<(), blockspan::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Endpoint URL; serves both chain data and transfer queries
    pub url: Url,
    /// Upper bound on one round trip, including retries
    pub rpc_timeout: Duration,
    /// Rate limit in requests per second (None for unlimited)
    pub rate_limit_per_second: Option<u32>,
    /// Retries for transient failures (not including the first attempt)
    pub max_retries: u32,
    /// Log full request and response packets at trace level
    pub log_payloads: bool,
}

impl ProviderConfig {
    /// Create a configuration for `url` with default limits
    pub fn new(url: impl AsRef<str>) -> Result<Self, ConfigError> {
        let raw = url.as_ref().trim();
        let url = Url::parse(raw).map_err(|source| ConfigError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        Ok(Self {
            url,
            rpc_timeout: DEFAULT_RPC_TIMEOUT,
            rate_limit_per_second: None,
            max_retries: DEFAULT_MAX_RETRIES,
            log_payloads: false,
        })
    }

    /// Reads the endpoint from `ALCHEMY_RPC_URL`
    ///
    /// The process environment wins over a `.env` file in the working
    /// directory. A missing or blank value is a [`ConfigError::MissingEndpoint`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_var(RPC_URL_ENV)
    }

    /// Reads the endpoint from the named environment variable
    pub fn from_env_var(variable: &str) -> Result<Self, ConfigError> {
        let raw = dotenvy::var(variable)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEndpoint {
                variable: variable.to_string(),
            })?;
        Self::new(raw)
    }

    /// Set rate limiting (requests per second)
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_second: u32) -> Self {
        self.rate_limit_per_second = Some(requests_per_second);
        self
    }

    /// Set rate limiting from an optional value
    #[must_use]
    pub fn with_rate_limit_opt(mut self, requests_per_second: Option<u32>) -> Self {
        self.rate_limit_per_second = requests_per_second;
        self
    }

    /// Set the per-call timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.rpc_timeout = timeout;
        self
    }

    /// Set the number of retries for transient failures
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Log full request and response packets
    #[must_use]
    pub fn with_payload_logging(mut self) -> Self {
        self.log_payloads = true;
        self
    }

    #[must_use]
    pub fn has_rate_limiting(&self) -> bool {
        self.rate_limit_per_second.is_some_and(|rps| rps > 0)
    }

    /// Checks numeric settings; called before any remote call is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_timeout.is_zero() {
            return Err(ConfigError::invalid_setting(
                "rpc_timeout",
                "must be greater than zero",
            ));
        }
        if self.rate_limit_per_second == Some(0) {
            return Err(ConfigError::invalid_setting(
                "rate_limit_per_second",
                "must be greater than zero when set",
            ));
        }
        Ok(())
    }
}

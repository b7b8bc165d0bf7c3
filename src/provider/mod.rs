// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Endpoint access for chain data and transfer logs
//!
//! This module provides:
//! - [`ProviderConfig`] - Endpoint URL, timeout, rate limit and retries
//! - [`LedgerClient`] - JSON-RPC client implementing both
//!   [`ChainDataSource`](crate::ChainDataSource) and
//!   [`TransferLogSource`](crate::TransferLogSource)
//! - [`create_ledger_client`] - The production HTTP client with logging,
//!   retry and rate limiting layers
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::provider::{create_ledger_client, ProviderConfig};
//! use blockspan::ChainDataSource;
//!
//! let config = ProviderConfig::from_env()?.with_rate_limit(10);
//! let client = create_ledger_client(&config)?;
//!
//! let head = client.latest_block_number().await?;
//! ```

mod config;
mod ledger;

pub use config::ProviderConfig;
pub use ledger::LedgerClient;

use alloy_transport_http::{reqwest, Http};
use tower::Layer;

use crate::errors::ConfigError;
use crate::transport::{
    LoggingLayer, LoggingService, RateLimitLayer, RateLimitService, RetryLayer, RetryService,
};

/// The production transport stack
pub type HttpTransport = LoggingService<RetryService<RateLimitService<Http<reqwest::Client>>>>;

/// Create an HTTP ledger client with the given configuration
///
/// Layers, outermost first: logging, retry, rate limit. The timeout in
/// `config` bounds each call including its retries.
///
/// # Errors
///
/// Returns [`ConfigError`] if a numeric setting is out of range. No request is
/// sent here; an unreachable endpoint surfaces on the first call.
pub fn create_ledger_client(
    config: &ProviderConfig,
) -> Result<LedgerClient<HttpTransport>, ConfigError> {
    config.validate()?;

    let http = Http::new(config.url.clone());
    let rate_limited = RateLimitLayer::from_config(config.rate_limit_per_second).layer(http);
    let retrying = RetryLayer::with_max_retries(config.max_retries).layer(rate_limited);

    let logging = if config.log_payloads {
        LoggingLayer::new().verbose()
    } else {
        LoggingLayer::new()
    };

    Ok(LedgerClient::new(
        logging.layer(retrying),
        config.rpc_timeout,
    ))
}

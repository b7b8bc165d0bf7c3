// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration for scan workflows
//!
//! This module controls how a time window is turned into a block range and how
//! much transfer data is requested per direction. Endpoint settings (URL,
//! timeout, rate limit, retries) live in [`ProviderConfig`](crate::ProviderConfig).
//!
//! # Example: Using defaults
//!
//! ```rust
//! use blockspan::ScanConfig;
//!
//! // 12s blocks, 1000 records per direction, newest first
//! let config = ScanConfig::default();
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Example: Custom configuration
//!
//! ```rust
//! use blockspan::{ScanConfigBuilder, SortOrder};
//! use std::time::Duration;
//!
//! let config = ScanConfigBuilder::new()
//!     .average_block_interval(Duration::from_secs(2))
//!     .max_count(250)
//!     .order(SortOrder::Asc)
//!     .build();
//! ```
//!
//! # Example: Chain-specific block time
//!
//! ```rust
//! use blockspan::ScanConfig;
//! use alloy_chains::NamedChain;
//!
//! let config = ScanConfig::for_chain(NamedChain::Polygon);
//! ```

use std::time::Duration;

use alloy_chains::NamedChain;

use crate::errors::ConfigError;
use crate::transfers::{SortOrder, TransferCategory};

pub mod constants;

use constants::{
    DEFAULT_AVERAGE_BLOCK_INTERVAL, DEFAULT_CATEGORIES, DEFAULT_TIMESTAMP_CONCURRENCY,
    MAX_TRANSFERS_PER_PAGE,
};

/// Configuration for one or more scan workflows
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Assumed seconds per block, used to size the search interval
    /// Default: 12 seconds
    pub average_block_interval: Duration,

    /// Maximum records requested per direction (one page)
    /// Default: 1000
    pub max_count: u32,

    /// Requested ordering, both for the remote query and the merged output
    /// Default: descending (newest first)
    pub order: SortOrder,

    /// Transfer categories to query
    /// Default: external, internal, erc20, erc721, erc1155
    pub categories: Vec<TransferCategory>,

    /// Upper bound on concurrent block timestamp lookups during aggregation
    /// Default: 8
    pub timestamp_concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            average_block_interval: DEFAULT_AVERAGE_BLOCK_INTERVAL,
            max_count: MAX_TRANSFERS_PER_PAGE,
            order: SortOrder::Desc,
            categories: DEFAULT_CATEGORIES.to_vec(),
            timestamp_concurrency: DEFAULT_TIMESTAMP_CONCURRENCY,
        }
    }
}

impl ScanConfig {
    /// Default config with the chain's average block time
    ///
    /// Falls back to 12 seconds for chains without a known block time.
    pub fn for_chain(chain: NamedChain) -> Self {
        Self {
            average_block_interval: chain
                .average_blocktime_hint()
                .unwrap_or(DEFAULT_AVERAGE_BLOCK_INTERVAL),
            ..Self::default()
        }
    }

    /// Checks every setting; called before any remote call is made
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.average_block_interval.is_zero() {
            return Err(ConfigError::invalid_setting(
                "average_block_interval",
                "must be greater than zero",
            ));
        }
        if self.max_count == 0 || self.max_count > MAX_TRANSFERS_PER_PAGE {
            return Err(ConfigError::invalid_setting(
                "max_count",
                format!("must be between 1 and {MAX_TRANSFERS_PER_PAGE}"),
            ));
        }
        if self.categories.is_empty() {
            return Err(ConfigError::invalid_setting(
                "categories",
                "at least one category is required",
            ));
        }
        if self.timestamp_concurrency == 0 {
            return Err(ConfigError::invalid_setting(
                "timestamp_concurrency",
                "must be greater than zero",
            ));
        }
        Ok(())
    }
}

/// Builder for [`ScanConfig`]
///
/// # Example
///
/// ```rust
/// use blockspan::{ScanConfigBuilder, TransferCategory};
///
/// let config = ScanConfigBuilder::new()
///     .categories(vec![TransferCategory::Erc20])
///     .timestamp_concurrency(4)
///     .build();
/// assert_eq!(config.categories, vec![TransferCategory::Erc20]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScanConfigBuilder {
    config: ScanConfig,
}

impl ScanConfigBuilder {
    /// Create a new builder starting from [`ScanConfig::default`]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a builder starting from [`ScanConfig::for_chain`]
    pub fn for_chain(chain: NamedChain) -> Self {
        Self {
            config: ScanConfig::for_chain(chain),
        }
    }

    /// Set the assumed average block interval
    pub fn average_block_interval(mut self, interval: Duration) -> Self {
        self.config.average_block_interval = interval;
        self
    }

    /// Set the maximum records requested per direction
    pub fn max_count(mut self, max_count: u32) -> Self {
        self.config.max_count = max_count;
        self
    }

    /// Set the requested ordering
    pub fn order(mut self, order: SortOrder) -> Self {
        self.config.order = order;
        self
    }

    /// Set the transfer categories to query
    pub fn categories(mut self, categories: Vec<TransferCategory>) -> Self {
        self.config.categories = categories;
        self
    }

    /// Set the concurrency limit for timestamp lookups
    pub fn timestamp_concurrency(mut self, limit: usize) -> Self {
        self.config.timestamp_concurrency = limit;
        self
    }

    /// Build the configuration
    pub fn build(self) -> ScanConfig {
        self.config
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! End-to-end scan of one address over one wall-clock window
//!
//! ```text
//! [start, end] -> BlockRangeResolver -> [start_block, head]
//!              -> TransferFetcher (incoming || outgoing)
//!              -> WindowAggregator -> AggregatedResult
//! ```
//!
//! Resolution and aggregation share one [`BlockTimestampOracle`], so a block
//! probed by the binary search is never fetched again during aggregation.
//! The oracle is created per scan; only an explicitly supplied warm cache
//! outlives it.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::{create_ledger_client, ProviderConfig, ScanConfig, TransferWindowScanner};
//! use std::sync::Arc;
//!
//! let client = Arc::new(create_ledger_client(&ProviderConfig::from_env()?)?);
//! let scanner = TransferWindowScanner::from_client(client, ScanConfig::default());
//!
//! let result = scanner.scan_last_hours(address, 24).await?;
//! println!("{} buys, {} sells", result.buy_count, result.sell_count);
//! ```

use std::future::Future;
use std::sync::Arc;

use alloy_primitives::Address;
use chrono::{TimeDelta, Utc};
use tracing::{info, warn, Instrument};

use crate::blocks::{
    BlockRangeResolver, BlockTimestampOracle, ChainDataSource, TimeRange, TimestampCache,
};
use crate::config::ScanConfig;
use crate::errors::{BlockWindowError, ScanError};
use crate::spans;
use crate::transfers::{
    AggregatedResult, DirectionalTransferSource, FetchOptions, SortOrder, TransferFetcher,
    TransferLogSource, WindowAggregator,
};

/// What to scan
#[derive(Debug, Clone, PartialEq)]
pub struct ScanRequest {
    pub address: Address,
    pub range: TimeRange,
    /// Overrides [`ScanConfig::order`] for this request
    pub order: Option<SortOrder>,
    /// Overrides [`ScanConfig::max_count`] for this request
    pub max_count: Option<u32>,
}

impl ScanRequest {
    pub fn new(address: Address, range: TimeRange) -> Self {
        Self {
            address,
            range,
            order: None,
            max_count: None,
        }
    }

    /// The window reaching `span` back from now
    pub fn last(address: Address, span: TimeDelta) -> Result<Self, BlockWindowError> {
        let range = TimeRange::ending_at(Utc::now(), span)?;
        Ok(Self::new(address, range))
    }

    /// The window of `hours` ending now
    pub fn last_hours(address: Address, hours: u32) -> Result<Self, BlockWindowError> {
        Self::last(address, TimeDelta::hours(i64::from(hours)))
    }

    #[must_use]
    pub fn with_order(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    #[must_use]
    pub fn with_max_count(mut self, max_count: u32) -> Self {
        self.max_count = Some(max_count);
        self
    }
}

/// Runs the resolve, fetch, aggregate workflow
///
/// Collaborators are passed in explicitly: a chain-data source for the head
/// and block timestamps, a directional transfer source, and the scan
/// configuration.
pub struct TransferWindowScanner<C, T> {
    chain: Arc<C>,
    transfers: T,
    config: ScanConfig,
    warm_cache: Option<Arc<dyn TimestampCache>>,
}

impl<L> TransferWindowScanner<L, TransferFetcher<L>>
where
    L: ChainDataSource + TransferLogSource,
{
    /// Scanner backed by one client serving both chain data and transfer logs
    pub fn from_client(client: Arc<L>, config: ScanConfig) -> Self {
        Self::new(client.clone(), TransferFetcher::new(client), config)
    }
}

impl<C, T> TransferWindowScanner<C, T>
where
    C: ChainDataSource,
    T: DirectionalTransferSource,
{
    pub fn new(chain: Arc<C>, transfers: T, config: ScanConfig) -> Self {
        Self {
            chain,
            transfers,
            config,
            warm_cache: None,
        }
    }

    /// Keeps block timestamps in `cache` across scans
    ///
    /// The cache is never invalidated. Callers scanning windows that end near
    /// the chain head should only share it when reorgs are not a concern.
    #[must_use]
    pub fn with_warm_cache(mut self, cache: Arc<dyn TimestampCache>) -> Self {
        self.warm_cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scans `request.address` over `request.range`
    ///
    /// Returns a complete result or the first fatal error; never a partial
    /// result.
    pub async fn scan(&self, request: &ScanRequest) -> Result<AggregatedResult, ScanError> {
        let config = self.effective_config(request);
        config.validate()?;

        let span = spans::scan(
            request.address,
            request.range.start().0,
            request.range.end().0,
        );

        async move {
            let oracle = self.oracle();

            let head = self
                .chain
                .latest_block_number()
                .await
                .map_err(BlockWindowError::from)?;

            let blocks = BlockRangeResolver::new(&oracle, config.average_block_interval)
                .resolve(request.range, head)
                .await?;

            let fetched = self
                .transfers
                .fetch_directional(request.address, blocks, &FetchOptions::from(&config))
                .await?;

            let result = WindowAggregator::new(&oracle, config.timestamp_concurrency)
                .aggregate(fetched, request.range, config.order, blocks)
                .await?;

            let cache_stats = oracle.cache_stats().await;
            info!(
                total = result.total_count,
                remote_lookups = oracle.remote_lookups(),
                cache = %cache_stats,
                "Scan complete"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Like [`scan`](Self::scan), abandoned as soon as `cancel` completes
    ///
    /// In-flight calls are dropped and no partial result is returned.
    pub async fn scan_until<F>(
        &self,
        request: &ScanRequest,
        cancel: F,
    ) -> Result<AggregatedResult, ScanError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            () = cancel => {
                warn!(address = %request.address, "Scan cancelled");
                Err(ScanError::Cancelled)
            }
            result = self.scan(request) => result,
        }
    }

    /// Scans the `hours` ending now
    pub async fn scan_last_hours(
        &self,
        address: Address,
        hours: u32,
    ) -> Result<AggregatedResult, ScanError> {
        let request = ScanRequest::last_hours(address, hours)?;
        self.scan(&request).await
    }

    fn effective_config(&self, request: &ScanRequest) -> ScanConfig {
        let mut config = self.config.clone();
        if let Some(order) = request.order {
            config.order = order;
        }
        if let Some(max_count) = request.max_count {
            config.max_count = max_count;
        }
        config
    }

    fn oracle(&self) -> BlockTimestampOracle<C> {
        match &self.warm_cache {
            Some(cache) => BlockTimestampOracle::with_cache(self.chain.clone(), cache.clone()),
            None => BlockTimestampOracle::new(self.chain.clone()),
        }
    }
}

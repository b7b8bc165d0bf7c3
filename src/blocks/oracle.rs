// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cached block timestamp lookups.
//!
//! The oracle sits between the algorithms in this crate and the chain-data
//! endpoint. Within one workflow run it never asks the endpoint about the
//! same block twice.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{trace, Instrument};

use crate::blocks::cache::{CacheStats, MemoryCache, TimestampCache};
use crate::blocks::window::{TimestampLookup, UnixTimestamp};
use crate::errors::RpcError;
use crate::spans;

/// The chain-data endpoint
///
/// Implemented by [`LedgerClient`](crate::LedgerClient) in production and by
/// synthetic chains in tests.
#[async_trait]
pub trait ChainDataSource: Send + Sync {
    /// Current chain head
    async fn latest_block_number(&self) -> Result<BlockNumber, RpcError>;

    /// Timestamp of `block`, or `None` if the endpoint has no such block
    async fn block_timestamp(&self, block: BlockNumber) -> Result<Option<UnixTimestamp>, RpcError>;
}

/// Block timestamp lookup with memoization
///
/// Found timestamps go into a [`TimestampCache`], which may be shared with
/// later runs. Blocks the endpoint reported as missing are remembered only by
/// this oracle instance, so a warm cache never pins a "not found" answer for a
/// block that has since been produced.
pub struct BlockTimestampOracle<C> {
    source: Arc<C>,
    cache: Arc<dyn TimestampCache>,
    missing: Mutex<HashSet<BlockNumber>>,
    remote_lookups: AtomicU64,
}

impl<C: ChainDataSource> BlockTimestampOracle<C> {
    /// Creates an oracle with a fresh, unbounded memory cache
    pub fn new(source: Arc<C>) -> Self {
        Self::with_cache(source, Arc::new(MemoryCache::new()))
    }

    /// Creates an oracle backed by the given cache
    pub fn with_cache(source: Arc<C>, cache: Arc<dyn TimestampCache>) -> Self {
        Self {
            source,
            cache,
            missing: Mutex::new(HashSet::new()),
            remote_lookups: AtomicU64::new(0),
        }
    }

    /// Resolves `block` to its timestamp
    ///
    /// One remote call per cache miss; `Ok(None)` when the endpoint has no
    /// data for the block.
    pub async fn resolve_timestamp(
        &self,
        block: BlockNumber,
    ) -> Result<Option<UnixTimestamp>, RpcError> {
        if let Some(ts) = self.cache.get(block).await {
            return Ok(Some(ts));
        }
        if self.missing.lock().await.contains(&block) {
            return Ok(None);
        }

        self.remote_lookups.fetch_add(1, Ordering::Relaxed);
        let resolved = self
            .source
            .block_timestamp(block)
            .instrument(spans::resolve_timestamp(block))
            .await?;

        match resolved {
            Some(ts) => self.cache.insert(block, ts).await,
            None => {
                trace!(block, "Block not found, remembering for this run");
                self.missing.lock().await.insert(block);
            }
        }
        Ok(resolved)
    }

    /// Number of lookups that reached the endpoint so far
    pub fn remote_lookups(&self) -> u64 {
        self.remote_lookups.load(Ordering::Relaxed)
    }

    /// Statistics of the underlying cache
    pub async fn cache_stats(&self) -> CacheStats {
        self.cache.stats().await
    }

    /// Name of the underlying cache backend
    pub fn cache_name(&self) -> &'static str {
        self.cache.name()
    }
}

#[async_trait]
impl<C: ChainDataSource> TimestampLookup for BlockTimestampOracle<C> {
    async fn timestamp_at(&self, block: BlockNumber) -> Result<Option<UnixTimestamp>, RpcError> {
        self.resolve_timestamp(block).await
    }
}

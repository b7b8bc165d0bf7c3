// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Cache backends for block timestamps
//!
//! This module provides different caching strategies for the timestamp oracle:
//!
//! - [`MemoryCache`]: In-memory cache with optional size limits (default)
//! - [`NoOpCache`]: Disables caching entirely (for testing or specific use cases)
//!
//! A cache only ever holds timestamps that were actually found. A cache kept
//! warm across workflow runs has no invalidation of its own: callers that
//! share one must only feed it blocks they consider final.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::{BlockTimestampOracle, MemoryCache, NoOpCache};
//! use std::sync::Arc;
//!
//! // Bounded memory cache shared across runs
//! let cache = Arc::new(MemoryCache::new().with_max_entries(100_000));
//! let oracle = BlockTimestampOracle::with_cache(chain.clone(), cache.clone());
//!
//! // No cache (always hit the endpoint)
//! let oracle = BlockTimestampOracle::with_cache(chain, Arc::new(NoOpCache));
//! ```

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::blocks::window::UnixTimestamp;

mod memory;
mod noop;

pub use memory::MemoryCache;
pub use noop::NoOpCache;

/// Statistics about cache performance
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Number of cache hits (successful retrievals)
    pub hits: u64,
    /// Number of cache misses (key not found)
    pub misses: u64,
    /// Number of entries evicted due to size limits
    pub evictions: u64,
    /// Current number of entries in the cache
    pub entries: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate as a percentage (0.0 to 100.0)
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hits={}, misses={}, evictions={}, entries={}, hit_rate={:.1}%",
            self.hits,
            self.misses,
            self.evictions,
            self.entries,
            self.hit_rate()
        )
    }
}

/// Trait for block timestamp cache backends
///
/// # Thread Safety
///
/// Implementations must be thread-safe: the oracle resolves many blocks
/// concurrently. Use interior mutability (e.g., `Mutex`) as needed.
#[async_trait]
pub trait TimestampCache: Send + Sync {
    /// Retrieves the cached timestamp for `block`, if any
    async fn get(&self, block: BlockNumber) -> Option<UnixTimestamp>;

    /// Stores the timestamp of `block`
    ///
    /// If the cache has size limits and is full, this may evict older entries.
    async fn insert(&self, block: BlockNumber, timestamp: UnixTimestamp);

    /// Clears all entries from the cache
    async fn clear(&self);

    /// Returns current cache statistics
    async fn stats(&self) -> CacheStats;

    /// Returns a human-readable name for this cache backend
    fn name(&self) -> &'static str;
}

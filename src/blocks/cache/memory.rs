// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! In-memory timestamp cache with optional size limit

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;
use tracing::debug;

use super::{CacheStats, TimestampCache};
use crate::blocks::window::UnixTimestamp;

/// Monotonic sequence number for deterministic LRU ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
struct AccessSequence(u64);

impl AccessSequence {
    fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

#[derive(Debug, Clone, Copy)]
struct CacheEntry {
    timestamp: UnixTimestamp,
    last_access: AccessSequence,
}

#[derive(Debug, Default)]
struct MemoryCacheState {
    entries: HashMap<BlockNumber, CacheEntry>,
    stats: CacheStats,
    next_seq: AccessSequence,
}

impl MemoryCacheState {
    fn bump_seq(&mut self) -> AccessSequence {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.next();
        seq
    }
}

/// In-memory cache of block timestamps
///
/// Block timestamps never change once a block is final, so there is no TTL.
/// An optional entry limit evicts the least recently used block.
///
/// # Examples
///
/// ```rust
/// use blockspan::MemoryCache;
///
/// // Unbounded (the default for a single workflow run)
/// let cache = MemoryCache::new();
///
/// // Bounded, for a cache kept warm across runs
/// let cache = MemoryCache::new().with_max_entries(100_000);
/// ```
///
/// # Performance
///
/// - Get: O(1) average case (HashMap lookup)
/// - Insert: O(1) without eviction, O(n) with eviction (finds LRU)
#[derive(Debug, Default)]
pub struct MemoryCache {
    max_entries: Option<usize>,
    state: Mutex<MemoryCacheState>,
}

impl MemoryCache {
    /// Creates a new memory cache with no limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of entries in the cache
    ///
    /// When the limit is reached, the least recently used entry is evicted.
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries.max(1));
        self
    }

    fn evict_lru(state: &mut MemoryCacheState) {
        let lru = state
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_access)
            .map(|(block, _)| *block);

        if let Some(block) = lru {
            debug!(block, "Evicting LRU timestamp");
            state.entries.remove(&block);
            state.stats.evictions += 1;
        }
    }
}

#[async_trait]
impl TimestampCache for MemoryCache {
    async fn get(&self, block: BlockNumber) -> Option<UnixTimestamp> {
        let mut state = self.state.lock().await;
        let seq = state.bump_seq();

        let found = state.entries.get_mut(&block).map(|entry| {
            entry.last_access = seq;
            entry.timestamp
        });

        if found.is_some() {
            state.stats.hits += 1;
        } else {
            state.stats.misses += 1;
        }
        found
    }

    async fn insert(&self, block: BlockNumber, timestamp: UnixTimestamp) {
        let mut state = self.state.lock().await;

        if let Some(max_entries) = self.max_entries {
            while state.entries.len() >= max_entries && !state.entries.contains_key(&block) {
                Self::evict_lru(&mut state);
            }
        }

        let last_access = state.bump_seq();
        state.entries.insert(
            block,
            CacheEntry {
                timestamp,
                last_access,
            },
        );
        state.stats.entries = state.entries.len();
    }

    async fn clear(&self) {
        let mut state = self.state.lock().await;
        debug!(entries = state.entries.len(), "Clearing memory cache");
        state.entries.clear();
        state.stats.entries = 0;
    }

    async fn stats(&self) -> CacheStats {
        self.state.lock().await.stats.clone()
    }

    fn name(&self) -> &'static str {
        "MemoryCache"
    }
}

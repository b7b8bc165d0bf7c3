// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! No-operation cache that disables caching entirely

use alloy_primitives::BlockNumber;
use async_trait::async_trait;

use super::{CacheStats, TimestampCache};
use crate::blocks::window::UnixTimestamp;

/// A no-operation cache that disables caching entirely
///
/// Always misses and ignores writes. With this backend the oracle issues one
/// remote lookup per found-block request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCache;

#[async_trait]
impl TimestampCache for NoOpCache {
    async fn get(&self, _block: BlockNumber) -> Option<UnixTimestamp> {
        None
    }

    async fn insert(&self, _block: BlockNumber, _timestamp: UnixTimestamp) {}

    async fn clear(&self) {}

    async fn stats(&self) -> CacheStats {
        CacheStats::default()
    }

    fn name(&self) -> &'static str {
        "NoOpCache"
    }
}

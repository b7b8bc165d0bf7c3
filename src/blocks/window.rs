// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block range resolution for mapping wall-clock windows to blockchain block ranges
//!
//! Resolution happens in two steps:
//!
//! 1. **Window estimation** - the window length divided by the average block
//!    interval gives an estimated block count. The search floor sits twice
//!    that many blocks below the chain head, leaving room for blocks that were
//!    slower than average.
//! 2. **Binary search** - the floor..=head interval is searched for the block
//!    whose timestamp is closest to the window start.
//!
//! The end of the resolved range is always the chain head at call time.
//!
//! # Known gaps
//!
//! - If blocks were on average *faster* than the configured interval, the
//!   floor may already postdate the window start. The resolver then returns the
//!   nearest block it can find inside the searched interval, which can be later
//!   than the ideal start.
//! - A probe whose timestamp is unknown moves the search to the right. Missing
//!   blocks or non-monotonic timestamps can therefore bias the result.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::{BlockRangeResolver, BlockTimestampOracle, TimeRange, UnixTimestamp};
//! use std::time::Duration;
//!
//! let oracle = BlockTimestampOracle::new(chain.clone());
//! let resolver = BlockRangeResolver::new(&oracle, Duration::from_secs(12));
//!
//! let range = TimeRange::new(UnixTimestamp(1_728_518_400), UnixTimestamp(1_728_604_800))?;
//! let head = chain.latest_block_number().await?;
//! let blocks = resolver.resolve(range, head).await?;
//!
//! println!("Blocks: [{}, {}]", blocks.start_block, blocks.end_block);
//! ```

use std::time::Duration;

use alloy_primitives::BlockNumber;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, Instrument};

use crate::config::constants::SEARCH_MARGIN_FACTOR;
use crate::errors::{BlockWindowError, RpcError};
use crate::spans;

/// Unix timestamp in seconds (always UTC)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnixTimestamp(pub i64);

impl UnixTimestamp {
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt.timestamp())
    }

    /// Creates a UnixTimestamp from a u64 value, saturating at `i64::MAX`
    pub fn from_u64(ts: u64) -> Self {
        Self(i64::try_from(ts).unwrap_or(i64::MAX))
    }

    /// Converts to a UTC datetime, if representable
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.0, 0)
    }

    /// Absolute distance in seconds between two timestamps
    pub fn abs_diff(&self, other: UnixTimestamp) -> u64 {
        self.0.abs_diff(other.0)
    }
}

impl std::fmt::Display for UnixTimestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Inclusive wall-clock window `[start, end]` with `start < end`
///
/// Deserialization goes through [`TimeRange::new`], so inverted or empty
/// windows are rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    start: UnixTimestamp,
    end: UnixTimestamp,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start: UnixTimestamp,
    end: UnixTimestamp,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = BlockWindowError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl TimeRange {
    /// Creates a new time range, rejecting empty and inverted windows
    pub fn new(start: UnixTimestamp, end: UnixTimestamp) -> Result<Self, BlockWindowError> {
        if end <= start {
            return Err(BlockWindowError::invalid_time_range(start, end));
        }
        Ok(Self { start, end })
    }

    /// The window ending at `end` and reaching `span` back in time
    pub fn ending_at(end: DateTime<Utc>, span: chrono::TimeDelta) -> Result<Self, BlockWindowError> {
        let end_ts = UnixTimestamp::from_datetime(end);
        let start_ts = UnixTimestamp(end_ts.0.saturating_sub(span.num_seconds()));
        Self::new(start_ts, end_ts)
    }

    pub fn start(&self) -> UnixTimestamp {
        self.start
    }

    pub fn end(&self) -> UnixTimestamp {
        self.end
    }

    /// Whether `ts` lies inside the window, both ends inclusive
    pub fn contains(&self, ts: UnixTimestamp) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// Window length
    pub fn span(&self) -> Duration {
        Duration::from_secs(self.end.abs_diff(self.start))
    }
}

/// Inclusive block range produced by [`BlockRangeResolver`]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedBlockRange {
    /// Block whose timestamp was closest to the window start (inclusive)
    pub start_block: BlockNumber,

    /// Chain head at resolution time (inclusive)
    pub end_block: BlockNumber,
}

impl ResolvedBlockRange {
    /// Returns the number of blocks in this range (inclusive)
    pub fn block_count(&self) -> u64 {
        self.end_block
            .saturating_sub(self.start_block)
            .saturating_add(1)
    }
}

/// Resolves a block number to its timestamp
///
/// `Ok(None)` means the endpoint answered but has no data for the block
/// (for example because it has not been produced yet).
#[async_trait]
pub trait TimestampLookup: Send + Sync {
    async fn timestamp_at(&self, block: BlockNumber) -> Result<Option<UnixTimestamp>, RpcError>;
}

/// Lowest block worth searching for a window of the given length
///
/// `estimated = ceil(span / interval)` blocks, and the floor is
/// `head - SEARCH_MARGIN_FACTOR * estimated`, clamped at genesis.
pub fn estimate_search_floor(
    range: &TimeRange,
    chain_head: BlockNumber,
    average_block_interval: Duration,
) -> BlockNumber {
    let interval_ms = average_block_interval.as_millis().max(1);
    let span_ms = range.span().as_millis();
    let estimated_blocks = span_ms.div_ceil(interval_ms);
    let margin = estimated_blocks.saturating_mul(SEARCH_MARGIN_FACTOR as u128);
    let margin = u64::try_from(margin).unwrap_or(u64::MAX);
    chain_head.saturating_sub(margin)
}

/// Binary search for the block whose timestamp is closest to `target`
///
/// # Algorithm
///
/// - **Search space**: `[low, high]`
/// - **Seed**: the closest match starts out as `low`; if `low` has no
///   timestamp the search cannot be seeded and fails
/// - **Probe**: `mid = (low + high) / 2`. An unknown timestamp moves
///   `low` past `mid`. Otherwise the closest match is updated and the search
///   narrows right when `ts(mid) < target`, left otherwise
/// - **Result**: the best block observed during the search. Under monotonic
///   timestamps this is the global closest; otherwise it is only the best seen
///
/// # Complexity
///
/// - Lookups: O(log(high - low)) plus the seed
pub async fn find_closest_block<L>(
    lookup: &L,
    target: UnixTimestamp,
    low: BlockNumber,
    high: BlockNumber,
) -> Result<BlockNumber, BlockWindowError>
where
    L: TimestampLookup + ?Sized,
{
    let anchor_ts = lookup
        .timestamp_at(low)
        .await?
        .ok_or(BlockWindowError::AnchorUnresolvable { block: low })?;

    let mut closest_block = low;
    let mut closest_diff = target.abs_diff(anchor_ts);

    let mut lo = low;
    let mut hi = high;
    let mut probes = 0u32;

    while lo <= hi {
        let mid = lo + (hi - lo) / 2;
        probes += 1;

        let Some(mid_ts) = lookup.timestamp_at(mid).await? else {
            debug!(block = mid, "No timestamp for probe, narrowing right");
            lo = mid + 1;
            continue;
        };

        let diff = target.abs_diff(mid_ts);
        if diff < closest_diff {
            closest_diff = diff;
            closest_block = mid;
        }

        if mid_ts < target {
            lo = mid + 1;
        } else {
            match mid.checked_sub(1) {
                Some(next) => hi = next,
                None => break,
            }
        }
    }

    debug!(
        target_ts = %target,
        closest_block,
        closest_diff,
        probes,
        "Found block closest to timestamp"
    );
    Ok(closest_block)
}

/// Converts a wall-clock window into a block range
///
/// Generic over any [`TimestampLookup`], so it can run against the cached
/// oracle in production and against a synthetic chain in tests.
pub struct BlockRangeResolver<'a, L: ?Sized> {
    lookup: &'a L,
    average_block_interval: Duration,
}

impl<'a, L> BlockRangeResolver<'a, L>
where
    L: TimestampLookup + ?Sized,
{
    /// Creates a resolver using `average_block_interval` for window estimation
    pub fn new(lookup: &'a L, average_block_interval: Duration) -> Self {
        Self {
            lookup,
            average_block_interval,
        }
    }

    /// Resolves `range` against a chain whose head is `chain_head`
    ///
    /// `end_block` is always `chain_head`; `start_block` is the block in
    /// `[floor, chain_head]` whose timestamp is closest to `range.start()`.
    pub async fn resolve(
        &self,
        range: TimeRange,
        chain_head: BlockNumber,
    ) -> Result<ResolvedBlockRange, BlockWindowError> {
        let span = spans::resolve_block_range(range.start().0, range.end().0, chain_head);

        async move {
            let floor = estimate_search_floor(&range, chain_head, self.average_block_interval);

            info!(
                start_ts = %range.start(),
                end_ts = %range.end(),
                chain_head,
                search_floor = floor,
                "Estimated search interval"
            );

            let start_block = find_closest_block(self.lookup, range.start(), floor, chain_head)
                .instrument(spans::find_closest_block(range.start().0, floor, chain_head))
                .await?;

            let blocks = ResolvedBlockRange {
                start_block,
                end_block: chain_head,
            };

            info!(
                start_block = blocks.start_block,
                end_block = blocks.end_block,
                block_count = blocks.block_count(),
                "Resolved block range"
            );

            Ok(blocks)
        }
        .instrument(span)
        .await
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Span creation helpers for blockspan operations.
//!
//! Telemetry stays out of business logic: instead of `#[instrument]`
//! attributes, each instrumented operation has a span helper here and the
//! operation attaches it to its future.
//!
//! Usage pattern:
//! ```rust,ignore
//! pub async fn my_operation(&self, param: Type) -> Result<T> {
//!     let span = spans::my_operation(param_value);
//!     async move {
//!         // Business logic here
//!     }
//!     .instrument(span)
//!     .await
//! }
//! ```
//!
//! Span guards are never held across `.await`, so instrumented futures stay
//! `Send`.

use alloy_primitives::{Address, BlockNumber};
use tracing::{Level, Span};

use crate::transfers::{QueryDirection, SortOrder};

/// Create span for one end-to-end scan of a wall-clock window.
///
/// Parent: None (root span for this operation)
/// Children: resolve_block_range, fetch_transfers (two), aggregate_window
#[inline]
pub(crate) fn scan(address: Address, start_ts: i64, end_ts: i64) -> Span {
    tracing::span!(
        Level::INFO,
        "blockspan.scan",
        address = %address,
        start_ts = start_ts,
        end_ts = end_ts,
    )
}

/// Create span for turning a time window into a block range.
///
/// Parent: scan span
/// Children: find_closest_block span
#[inline]
pub(crate) fn resolve_block_range(start_ts: i64, end_ts: i64, chain_head: BlockNumber) -> Span {
    tracing::info_span!(
        "blockspan.resolve_block_range",
        start_ts = start_ts,
        end_ts = end_ts,
        chain_head = chain_head,
    )
}

/// Create span for the binary search over `[low, high]`.
///
/// Parent: resolve_block_range span
/// Children: resolve_timestamp spans (one per probe)
#[inline]
pub(crate) fn find_closest_block(target_ts: i64, low: BlockNumber, high: BlockNumber) -> Span {
    tracing::debug_span!(
        "blockspan.find_closest_block",
        target_ts = target_ts,
        low = low,
        high = high,
    )
}

/// Create span for a single block timestamp lookup that missed the cache.
#[inline]
pub(crate) fn resolve_timestamp(block: BlockNumber) -> Span {
    tracing::trace_span!("blockspan.resolve_timestamp", block = block)
}

/// Create span for one directional transfer query.
///
/// Parent: scan span
#[inline]
pub(crate) fn fetch_transfers(
    direction: QueryDirection,
    address: Address,
    from_block: BlockNumber,
    to_block: BlockNumber,
) -> Span {
    tracing::info_span!(
        "blockspan.fetch_transfers",
        direction = %direction,
        address = %address,
        from_block = from_block,
        to_block = to_block,
    )
}

/// Create span for annotating and merging both directions.
///
/// Parent: scan span
/// Children: resolve_timestamp spans (one per distinct uncached block)
#[inline]
pub(crate) fn aggregate_window(incoming: usize, outgoing: usize, order: SortOrder) -> Span {
    tracing::info_span!(
        "blockspan.aggregate_window",
        raw_incoming = incoming,
        raw_outgoing = outgoing,
        order = %order,
    )
}

/// Create span for one JSON-RPC round trip through the transport stack.
///
/// `duration_ms` is recorded once the call completes.
#[inline]
pub(crate) fn rpc_call(method: &str) -> Span {
    tracing::debug_span!(
        "blockspan.rpc_call",
        method = %method,
        duration_ms = tracing::field::Empty,
    )
}

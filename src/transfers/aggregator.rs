// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Window aggregation
//!
//! The block range handed to the transfer queries is an estimate and usually
//! covers more than the requested window. Aggregation resolves the exact
//! timestamp of every record, drops those outside the window, tags the rest
//! by direction, and merges both directions into one ordered report.
//!
//! Timestamp resolution is the only part that talks to the network. It runs
//! once per distinct block with bounded concurrency; everything after it is
//! the pure [`assemble_window`] step.

use std::collections::{BTreeSet, HashMap, HashSet};

use alloy_primitives::BlockNumber;
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn, Instrument};

use crate::blocks::{ResolvedBlockRange, TimeRange, TimestampLookup, UnixTimestamp};
use crate::errors::{AggregationError, ErrorKind, RpcError};
use crate::spans;
use crate::transfers::types::{
    AnnotatedTransfer, Direction, DirectionalTransfers, QueryDirection, SortOrder, TransferPage,
};

/// Observability data about how the result was produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchInfo {
    pub resolved_start_block: BlockNumber,
    pub resolved_end_block: BlockNumber,
    /// Incoming records before window filtering
    pub raw_incoming_count: usize,
    /// Outgoing records before window filtering
    pub raw_outgoing_count: usize,
    /// Records dropped because their block timestamp could not be resolved
    pub unresolved_records: usize,
    /// Records returned by both queries (the address sent to itself),
    /// counted once under the incoming tag
    pub duplicate_records: usize,
    pub incoming_truncated: bool,
    pub outgoing_truncated: bool,
}

/// The single output of a scan workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedResult {
    pub transfers: Vec<AnnotatedTransfer>,
    pub total_count: usize,
    pub buy_count: usize,
    pub sell_count: usize,
    pub search_info: SearchInfo,
}

/// Merges directional transfer pages into one window report
///
/// Generic over any [`TimestampLookup`]; in a scan it shares the
/// [`BlockTimestampOracle`](crate::BlockTimestampOracle) used by block range
/// resolution, so blocks probed during the search are not fetched again.
pub struct WindowAggregator<'a, L: ?Sized> {
    lookup: &'a L,
    concurrency: usize,
}

impl<'a, L> WindowAggregator<'a, L>
where
    L: TimestampLookup + ?Sized,
{
    /// Creates an aggregator resolving at most `concurrency` blocks at once
    pub fn new(lookup: &'a L, concurrency: usize) -> Self {
        Self {
            lookup,
            concurrency: concurrency.max(1),
        }
    }

    /// Annotates, filters, merges and tallies the fetched records
    ///
    /// A record whose block has no timestamp, or whose lookup failed because
    /// the endpoint was unavailable, is dropped and counted in
    /// [`SearchInfo::unresolved_records`]. Any other lookup failure aborts
    /// aggregation.
    pub async fn aggregate(
        &self,
        fetched: DirectionalTransfers,
        range: TimeRange,
        order: SortOrder,
        blocks: ResolvedBlockRange,
    ) -> Result<AggregatedResult, AggregationError> {
        let span = spans::aggregate_window(
            fetched.incoming.records.len(),
            fetched.outgoing.records.len(),
            order,
        );

        async move {
            let timestamps = self.resolve_blocks(&fetched).await?;
            let result = assemble_window(fetched, &timestamps, range, order, blocks);

            info!(
                total = result.total_count,
                buys = result.buy_count,
                sells = result.sell_count,
                unresolved = result.search_info.unresolved_records,
                "Aggregated transfer window"
            );
            Ok(result)
        }
        .instrument(span)
        .await
    }

    /// Resolves every distinct block referenced by the fetched records
    async fn resolve_blocks(
        &self,
        fetched: &DirectionalTransfers,
    ) -> Result<HashMap<BlockNumber, UnixTimestamp>, AggregationError> {
        let distinct: BTreeSet<BlockNumber> = fetched
            .incoming
            .records
            .iter()
            .chain(fetched.outgoing.records.iter())
            .map(|record| record.block_number)
            .collect();

        debug!(
            distinct_blocks = distinct.len(),
            concurrency = self.concurrency,
            "Resolving record timestamps"
        );

        let lookups: Vec<(BlockNumber, Result<Option<UnixTimestamp>, RpcError>)> =
            stream::iter(distinct)
                .map(|block| async move { (block, self.lookup.timestamp_at(block).await) })
                .buffer_unordered(self.concurrency)
                .collect()
                .await;

        let mut timestamps = HashMap::with_capacity(lookups.len());
        for (block, lookup) in lookups {
            match lookup {
                Ok(Some(ts)) => {
                    timestamps.insert(block, ts);
                }
                Ok(None) => debug!(block, "No timestamp for record block, dropping"),
                Err(e) if e.kind() == ErrorKind::RemoteUnavailable => {
                    warn!(block, error = %e, "Timestamp lookup unavailable, dropping records");
                }
                Err(source) => return Err(AggregationError::TimestampLookup { block, source }),
            }
        }
        Ok(timestamps)
    }
}

/// Builds the window report from records and pre-resolved timestamps
///
/// Records whose block is absent from `timestamps` are dropped as
/// unresolved, records outside `range` are dropped as over-fetch. Survivors
/// are tagged `BUY` (incoming) or `SELL` (outgoing), concatenated incoming
/// first, and stably sorted by timestamp, so records sharing a timestamp keep
/// the order the endpoint returned them in.
///
/// A record appears at most once: a `unique_id` already seen is skipped, so
/// a transfer from the address to itself keeps the `BUY` tag.
pub fn assemble_window(
    fetched: DirectionalTransfers,
    timestamps: &HashMap<BlockNumber, UnixTimestamp>,
    range: TimeRange,
    order: SortOrder,
    blocks: ResolvedBlockRange,
) -> AggregatedResult {
    let DirectionalTransfers { incoming, outgoing } = fetched;

    let mut search_info = SearchInfo {
        resolved_start_block: blocks.start_block,
        resolved_end_block: blocks.end_block,
        raw_incoming_count: incoming.records.len(),
        raw_outgoing_count: outgoing.records.len(),
        unresolved_records: 0,
        duplicate_records: 0,
        incoming_truncated: incoming.truncated,
        outgoing_truncated: outgoing.truncated,
    };

    let mut transfers = Vec::with_capacity(incoming.records.len() + outgoing.records.len());
    let mut seen = HashSet::with_capacity(transfers.capacity());
    for (direction, page) in [
        (QueryDirection::Incoming, incoming),
        (QueryDirection::Outgoing, outgoing),
    ] {
        annotate_page(
            page,
            direction.tag(),
            timestamps,
            range,
            &mut seen,
            &mut transfers,
            &mut search_info,
        );
    }

    // sort_by is stable
    match order {
        SortOrder::Asc => transfers.sort_by(|a, b| a.timestamp.cmp(&b.timestamp)),
        SortOrder::Desc => transfers.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }

    let buy_count = transfers
        .iter()
        .filter(|t| t.direction == Direction::Buy)
        .count();
    let sell_count = transfers
        .iter()
        .filter(|t| t.direction == Direction::Sell)
        .count();

    AggregatedResult {
        total_count: transfers.len(),
        buy_count,
        sell_count,
        transfers,
        search_info,
    }
}

fn annotate_page(
    page: TransferPage,
    direction: Direction,
    timestamps: &HashMap<BlockNumber, UnixTimestamp>,
    range: TimeRange,
    seen: &mut HashSet<String>,
    out: &mut Vec<AnnotatedTransfer>,
    search_info: &mut SearchInfo,
) {
    for record in page.records {
        if !seen.insert(record.unique_id.clone()) {
            search_info.duplicate_records += 1;
            continue;
        }
        let Some(&ts) = timestamps.get(&record.block_number) else {
            search_info.unresolved_records += 1;
            continue;
        };
        if range.contains(ts) {
            out.push(AnnotatedTransfer::new(record, ts, direction));
        }
    }
}

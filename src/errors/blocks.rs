// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for block range resolution.
//!
//! This module provides error types for operations in the `blocks` module,
//! particularly for mapping a wall-clock window onto a block range.

use alloy_primitives::BlockNumber;

use super::RpcError;
use crate::blocks::UnixTimestamp;

/// Errors that can occur while resolving a time window into a block range.
///
/// # Examples
///
/// ```rust,ignore
/// use blockspan::{BlockRangeResolver, BlockWindowError};
///
/// match resolver.resolve(range, head).await {
///     Ok(blocks) => println!("Blocks: {}..={}", blocks.start_block, blocks.end_block),
///     Err(BlockWindowError::AnchorUnresolvable { block }) => {
///         eprintln!("No timestamp for search anchor {block}");
///     }
///     Err(BlockWindowError::Rpc(e)) if e.is_retryable() => {
///         eprintln!("RPC failure, retrying...: {e}");
///     }
///     Err(e) => eprintln!("Other error: {e}"),
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum BlockWindowError {
    /// The requested time window is empty or inverted.
    #[error("Invalid timestamp range: start {start} must be before end {end}")]
    InvalidTimeRange {
        /// Requested window start
        start: UnixTimestamp,
        /// Requested window end
        end: UnixTimestamp,
    },

    /// The lower bound of the search interval has no timestamp, so the
    /// binary search has nothing to seed its closest match with.
    #[error("Failed to resolve timestamp of search anchor block {block}")]
    AnchorUnresolvable {
        /// The anchor block that could not be resolved
        block: BlockNumber,
    },

    /// RPC error when talking to the chain-data endpoint.
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),
}

impl BlockWindowError {
    /// Create an `InvalidTimeRange` error.
    pub fn invalid_time_range(start: UnixTimestamp, end: UnixTimestamp) -> Self {
        BlockWindowError::InvalidTimeRange { start, end }
    }
}

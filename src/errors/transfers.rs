// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for transfer fetching and window aggregation.

use super::RpcError;
use crate::transfers::QueryDirection;

/// Errors from the directional transfer queries.
#[derive(Debug, thiserror::Error)]
pub enum TransferFetchError {
    /// One of the directional queries failed.
    #[error("{direction} transfer query failed")]
    Query {
        /// Which leg of the dual query failed
        direction: QueryDirection,
        /// The underlying RPC error
        #[source]
        source: RpcError,
    },
}

impl TransferFetchError {
    /// Create a `Query` error for the given direction.
    pub fn query(direction: QueryDirection, source: RpcError) -> Self {
        TransferFetchError::Query { direction, source }
    }

    /// The direction whose query failed.
    pub fn direction(&self) -> QueryDirection {
        match self {
            TransferFetchError::Query { direction, .. } => *direction,
        }
    }
}

/// Errors from window aggregation.
///
/// Per-record timestamp failures caused by an unavailable endpoint degrade by
/// omission. Only responses that violate the expected shape escalate.
#[derive(Debug, thiserror::Error)]
pub enum AggregationError {
    /// A block timestamp lookup returned a malformed response.
    #[error("Timestamp lookup for block {block} failed")]
    TimestampLookup {
        /// Block whose timestamp was being resolved
        block: u64,
        /// The underlying RPC error
        #[source]
        source: RpcError,
    },
}

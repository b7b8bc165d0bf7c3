// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Error types for the blockspan library.
//!
//! This module provides strongly-typed errors for all public APIs in blockspan.
//! It follows a hybrid approach:
//!
//! - **Module-specific errors** for fine-grained error handling (`BlockWindowError`,
//!   `TransferFetchError`, etc.)
//! - **Unified error type** (`ScanError`) returned by the end-to-end workflow
//!
//! # Architecture
//!
//! - [`ConfigError`] - Missing endpoint or invalid settings, raised before any remote call
//! - [`RpcError`] - One failed round trip, classified by [`ErrorKind`]
//! - [`BlockWindowError`] - Errors from resolving a time window into blocks
//! - [`TransferFetchError`] - Errors from the directional transfer queries
//! - [`AggregationError`] - Fatal errors while annotating fetched records
//!
//! "Not found" is never an error: lookups that can legitimately come back
//! empty return `Option`.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::{ScanError, TransferWindowScanner};
//!
//! match scanner.scan(&request).await {
//!     Ok(result) => println!("{} transfers", result.total_count),
//!     Err(ScanError::Config(e)) => eprintln!("Fix your configuration: {e}"),
//!     Err(e) if e.is_retryable() => eprintln!("Endpoint unavailable, try again: {e}"),
//!     Err(e) => eprintln!("Scan failed: {e}"),
//! }
//! ```

mod blocks;
mod config;
mod rpc;
mod transfers;

pub use blocks::BlockWindowError;
pub use config::ConfigError;
pub use rpc::{ErrorKind, RpcError};
pub use transfers::{AggregationError, TransferFetchError};

/// Unified error type for one resolution workflow.
///
/// A failed workflow reports exactly one of these, describing the first fatal
/// cause. No partially populated result is ever returned alongside it.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Configuration was missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error from block range resolution.
    #[error("Block window error: {0}")]
    BlockWindow(#[from] BlockWindowError),

    /// Error from the directional transfer queries.
    #[error("Transfer fetch error: {0}")]
    Fetch(#[from] TransferFetchError),

    /// Error from window aggregation.
    #[error("Aggregation error: {0}")]
    Aggregation(#[from] AggregationError),

    /// The workflow was cancelled before it completed.
    #[error("Scan cancelled")]
    Cancelled,
}

impl ScanError {
    /// The RPC error at the root of this failure, if any.
    pub fn rpc_error(&self) -> Option<&RpcError> {
        match self {
            ScanError::BlockWindow(BlockWindowError::Rpc(e)) => Some(e),
            ScanError::Fetch(TransferFetchError::Query { source, .. }) => Some(source),
            ScanError::Aggregation(AggregationError::TimestampLookup { source, .. }) => {
                Some(source)
            }
            _ => None,
        }
    }

    /// Whether re-running the workflow could succeed.
    pub fn is_retryable(&self) -> bool {
        self.rpc_error().is_some_and(RpcError::is_retryable)
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Directional transfer retrieval and window aggregation.
//!
//! This module provides functionality for:
//! - Querying incoming and outgoing transfers of an address over a block range
//! - Annotating records with block timestamps and direction tags
//! - Filtering to the exact wall-clock window and merging into one report

pub mod aggregator;
pub mod fetcher;
pub mod types;

// Re-export public API
pub use aggregator::{assemble_window, AggregatedResult, SearchInfo, WindowAggregator};
pub use fetcher::{
    DirectionalTransferSource, FetchOptions, TransferFetcher, TransferLogSource, TransferQuery,
};
pub use types::{
    AnnotatedTransfer, Direction, DirectionalTransfers, QueryDirection, RawTransfer, SortOrder,
    TransferCategory, TransferPage,
};

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Well-known constants
//!
//! This module centralizes magic numbers used throughout the crate.

use std::time::Duration;

use crate::transfers::TransferCategory;

/// Average Ethereum mainnet block interval since the merge
pub const DEFAULT_AVERAGE_BLOCK_INTERVAL: Duration = Duration::from_secs(12);

/// The search floor sits this many estimated windows below the chain head.
///
/// Fixed: blocks slower than the configured average still land inside the
/// searched interval as long as they are at most twice as slow.
pub const SEARCH_MARGIN_FACTOR: u64 = 2;

/// Largest page `alchemy_getAssetTransfers` returns per request
pub const MAX_TRANSFERS_PER_PAGE: u32 = 1000;

/// Default number of block timestamps resolved concurrently
pub const DEFAULT_TIMESTAMP_CONCURRENCY: usize = 8;

/// Default timeout for a single RPC round trip
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable holding the endpoint URL
pub const RPC_URL_ENV: &str = "ALCHEMY_RPC_URL";

/// Transfer categories queried when none are configured
pub const DEFAULT_CATEGORIES: [TransferCategory; 5] = [
    TransferCategory::External,
    TransferCategory::Internal,
    TransferCategory::Erc20,
    TransferCategory::Erc721,
    TransferCategory::Erc1155,
];

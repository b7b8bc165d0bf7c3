// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Resolve a wall-clock window to an EVM block range and report the transfer
//! activity of one address inside it.
//!
//! A scan runs in three steps:
//!
//! 1. [`BlockRangeResolver`] estimates how many blocks the window spans and
//!    binary searches for the block closest to the window start.
//! 2. [`TransferFetcher`] asks the transfer-log endpoint for incoming and
//!    outgoing transfers over that block range, one query per direction.
//! 3. [`WindowAggregator`] resolves each record's block timestamp, drops
//!    records outside the window, tags them `BUY`/`SELL`, and merges them
//!    into one [`AggregatedResult`].
//!
//! [`TransferWindowScanner`] wires the steps together.

mod errors;
mod spans;

pub mod blocks;
pub mod bootstrap;
pub mod config;
pub mod provider;
pub mod transfers;
pub mod transport;
pub mod workflow;

pub use blocks::*;
pub use config::{ScanConfig, ScanConfigBuilder};
pub use errors::*;
pub use provider::{create_ledger_client, HttpTransport, LedgerClient, ProviderConfig};
pub use transfers::*;
pub use workflow::{ScanRequest, TransferWindowScanner};

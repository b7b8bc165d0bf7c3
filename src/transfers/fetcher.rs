// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Directional transfer queries
//!
//! The endpoint is asked twice per window, once with the address as
//! recipient and once as sender. Both legs sit behind
//! [`DirectionalTransferSource`], so a future endpoint that answers both in a
//! single query can replace [`TransferFetcher`] without touching aggregation.
//!
//! # Examples
//!
//! ```rust,ignore
//! use blockspan::{DirectionalTransferSource, FetchOptions, TransferFetcher};
//!
//! let fetcher = TransferFetcher::new(client.clone());
//! let fetched = fetcher
//!     .fetch_directional(address, blocks, &FetchOptions::from(&config))
//!     .await?;
//!
//! println!(
//!     "{} incoming, {} outgoing",
//!     fetched.incoming.records.len(),
//!     fetched.outgoing.records.len()
//! );
//! ```

use std::sync::Arc;

use alloy_primitives::{Address, BlockNumber};
use async_trait::async_trait;
use tracing::{info, warn, Instrument};

use crate::blocks::ResolvedBlockRange;
use crate::config::ScanConfig;
use crate::errors::{RpcError, TransferFetchError};
use crate::spans;
use crate::transfers::types::{
    DirectionalTransfers, QueryDirection, SortOrder, TransferCategory, TransferPage,
};

/// One bounded, single-direction transfer query
#[derive(Debug, Clone, PartialEq)]
pub struct TransferQuery {
    pub direction: QueryDirection,
    pub address: Address,
    pub from_block: BlockNumber,
    pub to_block: BlockNumber,
    pub max_count: u32,
    /// Advisory: the endpoint may honour it, the merged output does not rely on it
    pub order: SortOrder,
    pub categories: Vec<TransferCategory>,
}

/// Per-scan query options shared by both directions
#[derive(Debug, Clone, PartialEq)]
pub struct FetchOptions {
    pub max_count: u32,
    pub order: SortOrder,
    pub categories: Vec<TransferCategory>,
}

impl From<&ScanConfig> for FetchOptions {
    fn from(config: &ScanConfig) -> Self {
        Self {
            max_count: config.max_count,
            order: config.order,
            categories: config.categories.clone(),
        }
    }
}

/// The transfer-log endpoint
#[async_trait]
pub trait TransferLogSource: Send + Sync {
    /// Runs exactly one query and returns at most `query.max_count` records
    async fn query_transfers(&self, query: &TransferQuery) -> Result<TransferPage, RpcError>;
}

/// Fetches both directions of activity for an address
#[async_trait]
pub trait DirectionalTransferSource: Send + Sync {
    async fn fetch_directional(
        &self,
        address: Address,
        blocks: ResolvedBlockRange,
        options: &FetchOptions,
    ) -> Result<DirectionalTransfers, TransferFetchError>;
}

/// Issues one query per direction against a [`TransferLogSource`]
///
/// The two queries are independent and run concurrently. No pagination: a
/// page the endpoint marks as incomplete is logged and flagged as truncated.
pub struct TransferFetcher<S> {
    source: Arc<S>,
}

impl<S> Clone for TransferFetcher<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
        }
    }
}

impl<S: TransferLogSource> TransferFetcher<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Runs a single directional query
    pub async fn fetch(&self, query: &TransferQuery) -> Result<TransferPage, TransferFetchError> {
        let span = spans::fetch_transfers(
            query.direction,
            query.address,
            query.from_block,
            query.to_block,
        );

        async {
            let page = self
                .source
                .query_transfers(query)
                .await
                .map_err(|e| TransferFetchError::query(query.direction, e))?;

            if page.truncated {
                warn!(
                    direction = %query.direction,
                    returned = page.records.len(),
                    max_count = query.max_count,
                    "Endpoint has more records than one page; remaining pages are not fetched"
                );
            }

            info!(
                direction = %query.direction,
                returned = page.records.len(),
                "Fetched transfer page"
            );
            Ok(page)
        }
        .instrument(span)
        .await
    }

    fn query_for(
        direction: QueryDirection,
        address: Address,
        blocks: ResolvedBlockRange,
        options: &FetchOptions,
    ) -> TransferQuery {
        TransferQuery {
            direction,
            address,
            from_block: blocks.start_block,
            to_block: blocks.end_block,
            max_count: options.max_count,
            order: options.order,
            categories: options.categories.clone(),
        }
    }
}

#[async_trait]
impl<S: TransferLogSource> DirectionalTransferSource for TransferFetcher<S> {
    async fn fetch_directional(
        &self,
        address: Address,
        blocks: ResolvedBlockRange,
        options: &FetchOptions,
    ) -> Result<DirectionalTransfers, TransferFetchError> {
        let incoming = Self::query_for(QueryDirection::Incoming, address, blocks, options);
        let outgoing = Self::query_for(QueryDirection::Outgoing, address, blocks, options);

        let (incoming, outgoing) =
            futures::future::try_join(self.fetch(&incoming), self.fetch(&outgoing)).await?;

        Ok(DirectionalTransfers { incoming, outgoing })
    }
}

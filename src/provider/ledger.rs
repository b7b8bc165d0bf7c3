// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! JSON-RPC client for chain data and transfer logs
//!
//! [`LedgerClient`] speaks three methods:
//!
//! - `eth_blockNumber` for the chain head
//! - `eth_getBlockByNumber` for block timestamps
//! - `alchemy_getAssetTransfers` for one page of transfers in one direction
//!
//! Every call gets a fresh correlation id and is bounded by a timeout. The
//! response is checked in this order: the id must match, then either the
//! `result` decodes into the expected shape or the populated `error` member
//! becomes [`RpcError::ErrorResponse`]. Rate limit rejections in the `error`
//! member become [`RpcError::Throttled`] and count as unavailability.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_json_rpc::{Id, Request, RequestPacket, ResponsePacket, ResponsePayload, RpcSend};
use alloy_primitives::{Address, BlockNumber, TxHash, U256, U64};
use alloy_transport::TransportError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower::{Service, ServiceExt};
use tracing::{trace, warn};

use crate::blocks::{ChainDataSource, UnixTimestamp};
use crate::errors::RpcError;
use crate::transfers::{
    QueryDirection, RawTransfer, SortOrder, TransferCategory, TransferLogSource, TransferPage,
    TransferQuery,
};

const BLOCK_NUMBER: &str = "eth_blockNumber";
const BLOCK_BY_NUMBER: &str = "eth_getBlockByNumber";
const ASSET_TRANSFERS: &str = "alchemy_getAssetTransfers";

/// Client for a JSON-RPC endpoint that serves chain data and transfer logs
///
/// Generic over the tower transport so that tests can substitute a scripted
/// service for HTTP. See [`create_ledger_client`](super::create_ledger_client)
/// for the production stack.
#[derive(Debug)]
pub struct LedgerClient<S> {
    transport: S,
    rpc_timeout: Duration,
    next_id: AtomicU64,
}

impl<S> LedgerClient<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    pub fn new(transport: S, rpc_timeout: Duration) -> Self {
        Self {
            transport,
            rpc_timeout,
            next_id: AtomicU64::new(1),
        }
    }

    pub fn rpc_timeout(&self) -> Duration {
        self.rpc_timeout
    }

    /// One request/response round trip
    async fn call<P, R>(&self, method: &'static str, params: P) -> Result<R, RpcError>
    where
        P: RpcSend,
        R: DeserializeOwned,
    {
        let id = Id::Number(self.next_id.fetch_add(1, Ordering::Relaxed));
        let request = Request::new(method, id.clone(), params)
            .serialize()
            .map_err(|source| RpcError::InvalidRequest {
                method: method.to_string(),
                source,
            })?;

        let packet = self.transport.clone().oneshot(RequestPacket::Single(request));
        let response = tokio::time::timeout(self.rpc_timeout, packet)
            .await
            .map_err(|_| RpcError::timeout(method, self.rpc_timeout))?
            .map_err(|e| RpcError::from_transport(method, e))?;

        let response = match response {
            ResponsePacket::Single(response) => response,
            ResponsePacket::Batch(responses) => {
                return Err(RpcError::malformed(
                    method,
                    format!("expected one response, got a batch of {}", responses.len()),
                ))
            }
        };

        if response.id != id {
            return Err(RpcError::malformed(
                method,
                format!(
                    "response id {:?} does not match request id {:?}",
                    response.id, id
                ),
            ));
        }

        match response.payload {
            ResponsePayload::Success(raw) => {
                trace!(method, bytes = raw.get().len(), "Decoding result");
                serde_json::from_str(raw.get()).map_err(|e| {
                    RpcError::malformed(method, format!("undecodable result: {e}"))
                })
            }
            ResponsePayload::Failure(error) => Err(RpcError::from_error_payload(method, &error)),
        }
    }
}

#[async_trait]
impl<S> ChainDataSource for LedgerClient<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    async fn latest_block_number(&self) -> Result<BlockNumber, RpcError> {
        let head: U64 = self.call(BLOCK_NUMBER, ()).await?;
        Ok(head.to::<u64>())
    }

    async fn block_timestamp(&self, block: BlockNumber) -> Result<Option<UnixTimestamp>, RpcError> {
        let header: Option<BlockTimestampWire> =
            self.call(BLOCK_BY_NUMBER, (U64::from(block), false)).await?;

        let Some(header) = header else {
            return Ok(None);
        };
        let timestamp = header.timestamp.ok_or_else(|| {
            RpcError::malformed(BLOCK_BY_NUMBER, format!("block {block} has no timestamp"))
        })?;
        Ok(Some(UnixTimestamp::from_u64(timestamp.to::<u64>())))
    }
}

#[async_trait]
impl<S> TransferLogSource for LedgerClient<S>
where
    S: Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + Sync
        + 'static,
    S::Future: Send,
{
    async fn query_transfers(&self, query: &TransferQuery) -> Result<TransferPage, RpcError> {
        let params = AssetTransfersParams::from(query);
        let response: AssetTransfersWire = self.call(ASSET_TRANSFERS, [params]).await?;

        let max_count = query.max_count as usize;
        let mut truncated = response.page_key.is_some();
        let mut records: Vec<RawTransfer> = response
            .transfers
            .into_iter()
            .map(RawTransfer::from)
            .collect();

        if records.len() > max_count {
            warn!(
                direction = %query.direction,
                returned = records.len(),
                max_count,
                "Endpoint returned more records than requested, keeping the first page"
            );
            records.truncate(max_count);
            truncated = true;
        }

        Ok(TransferPage { records, truncated })
    }
}

/// `eth_getBlockByNumber` result, reduced to the one field we read
#[derive(Debug, Deserialize)]
struct BlockTimestampWire {
    timestamp: Option<U64>,
}

/// `alchemy_getAssetTransfers` parameter object
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssetTransfersParams {
    from_block: U64,
    to_block: U64,
    #[serde(skip_serializing_if = "Option::is_none")]
    from_address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    to_address: Option<Address>,
    category: Vec<TransferCategory>,
    max_count: U64,
    order: SortOrder,
    with_metadata: bool,
}

impl From<&TransferQuery> for AssetTransfersParams {
    fn from(query: &TransferQuery) -> Self {
        let (from_address, to_address) = match query.direction {
            QueryDirection::Incoming => (None, Some(query.address)),
            QueryDirection::Outgoing => (Some(query.address), None),
        };
        Self {
            from_block: U64::from(query.from_block),
            to_block: U64::from(query.to_block),
            from_address,
            to_address,
            category: query.categories.clone(),
            max_count: U64::from(query.max_count),
            order: query.order,
            with_metadata: false,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetTransfersWire {
    transfers: Vec<AssetTransferWire>,
    /// Present when more records match than fit in this page
    #[serde(default)]
    page_key: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetTransferWire {
    block_num: U64,
    hash: TxHash,
    from: Address,
    to: Option<Address>,
    category: TransferCategory,
    value: Option<f64>,
    asset: Option<String>,
    #[serde(default)]
    raw_contract: Option<RawContractWire>,
    unique_id: String,
}

#[derive(Debug, Deserialize)]
struct RawContractWire {
    value: Option<U256>,
}

impl From<AssetTransferWire> for RawTransfer {
    fn from(wire: AssetTransferWire) -> Self {
        RawTransfer {
            block_number: wire.block_num.to::<u64>(),
            tx_hash: wire.hash,
            from: wire.from,
            to: wire.to,
            category: wire.category,
            amount: wire.value,
            asset: wire.asset,
            raw_amount: wire.raw_contract.and_then(|raw| raw.value),
            unique_id: wire.unique_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;
    use serde_json::json;

    #[test]
    fn test_incoming_params_use_to_address() {
        let query = TransferQuery {
            direction: QueryDirection::Incoming,
            address: address!("6982508145454ce325ddbe47a25d4ec3d2311933"),
            from_block: 0x10,
            to_block: 0x20,
            max_count: 1000,
            order: SortOrder::Desc,
            categories: vec![TransferCategory::External, TransferCategory::Erc20],
        };

        let params = serde_json::to_value(AssetTransfersParams::from(&query)).unwrap();

        assert_eq!(
            params,
            json!({
                "fromBlock": "0x10",
                "toBlock": "0x20",
                "toAddress": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
                "category": ["external", "erc20"],
                "maxCount": "0x3e8",
                "order": "desc",
                "withMetadata": false,
            })
        );
    }

    #[test]
    fn test_outgoing_params_use_from_address() {
        let query = TransferQuery {
            direction: QueryDirection::Outgoing,
            address: Address::ZERO,
            from_block: 1,
            to_block: 2,
            max_count: 5,
            order: SortOrder::Asc,
            categories: vec![TransferCategory::Erc721],
        };

        let params = serde_json::to_value(AssetTransfersParams::from(&query)).unwrap();

        assert!(params.get("toAddress").is_none());
        assert_eq!(
            params["fromAddress"],
            "0x0000000000000000000000000000000000000000"
        );
        assert_eq!(params["order"], "asc");
        assert_eq!(params["maxCount"], "0x5");
    }

    #[test]
    fn test_transfer_wire_decoding() {
        let wire: AssetTransferWire = serde_json::from_value(json!({
            "blockNum": "0x12a05f2",
            "uniqueId": "0xabc:log:7",
            "hash": "0x0000000000000000000000000000000000000000000000000000000000000abc",
            "from": "0x1111111111111111111111111111111111111111",
            "to": null,
            "value": 12.5,
            "erc721TokenId": null,
            "asset": "PEPE",
            "category": "erc20",
            "rawContract": {
                "value": "0x2b5e3af16b1880000",
                "address": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
                "decimal": "0x12"
            }
        }))
        .unwrap();

        let record = RawTransfer::from(wire);
        assert_eq!(record.block_number, 0x12a05f2);
        assert_eq!(record.to, None);
        assert_eq!(record.amount, Some(12.5));
        assert_eq!(record.category, TransferCategory::Erc20);
        assert_eq!(
            record.raw_amount,
            Some(U256::from(50_000_000_000_000_000_000u128))
        );
    }

    #[test]
    fn test_block_wire_without_timestamp() {
        let wire: BlockTimestampWire = serde_json::from_value(json!({ "number": "0x1" })).unwrap();
        assert!(wire.timestamp.is_none());
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Test helpers for blockspan integration tests
//!
//! Provides synthetic chains, scripted transfer sources and a scripted
//! JSON-RPC transport so the workflow can run without a real endpoint.

#![allow(dead_code)]

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use alloy_json_rpc::{Id, RequestPacket, ResponsePacket};
use alloy_primitives::{Address, BlockNumber, TxHash};
use alloy_transport::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use blockspan::{
    ChainDataSource, QueryDirection, RawTransfer, RpcError, TransferCategory, TransferLogSource,
    TransferPage, TransferQuery, UnixTimestamp,
};
use serde_json::{json, Value};
use tower::Service;

/// Genesis timestamp used by most tests (2023-11-14T22:13:20Z)
pub const GENESIS: i64 = 1_700_000_000;

/// Monotonic chain with `ts(block) = genesis + interval * block`
///
/// Blocks above the head and blocks marked missing have no timestamp.
pub struct SyntheticChain {
    genesis: i64,
    interval: i64,
    head: BlockNumber,
    missing: HashSet<BlockNumber>,
    timestamp_calls: AtomicU64,
    head_calls: AtomicU64,
}

impl SyntheticChain {
    pub fn new(genesis: i64, interval: i64, head: BlockNumber) -> Self {
        Self {
            genesis,
            interval,
            head,
            missing: HashSet::new(),
            timestamp_calls: AtomicU64::new(0),
            head_calls: AtomicU64::new(0),
        }
    }

    pub fn with_missing(mut self, blocks: impl IntoIterator<Item = BlockNumber>) -> Self {
        self.missing.extend(blocks);
        self
    }

    pub fn timestamp_of(&self, block: BlockNumber) -> UnixTimestamp {
        UnixTimestamp(self.genesis + self.interval * block as i64)
    }

    pub fn head(&self) -> BlockNumber {
        self.head
    }

    /// Number of `block_timestamp` calls that reached this chain
    pub fn timestamp_calls(&self) -> u64 {
        self.timestamp_calls.load(Ordering::SeqCst)
    }

    pub fn head_calls(&self) -> u64 {
        self.head_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainDataSource for SyntheticChain {
    async fn latest_block_number(&self) -> Result<BlockNumber, RpcError> {
        self.head_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.head)
    }

    async fn block_timestamp(&self, block: BlockNumber) -> Result<Option<UnixTimestamp>, RpcError> {
        self.timestamp_calls.fetch_add(1, Ordering::SeqCst);
        if block > self.head || self.missing.contains(&block) {
            return Ok(None);
        }
        Ok(Some(self.timestamp_of(block)))
    }
}

/// A transfer record at `block`, distinguishable by `id`
pub fn transfer(block: BlockNumber, id: &str) -> RawTransfer {
    RawTransfer {
        block_number: block,
        tx_hash: TxHash::left_padding_from(&block.to_be_bytes()),
        from: Address::repeat_byte(0x11),
        to: Some(Address::repeat_byte(0x22)),
        category: TransferCategory::Erc20,
        amount: Some(1.0),
        asset: Some("PEPE".to_string()),
        raw_amount: None,
        unique_id: id.to_string(),
    }
}

/// Transfer-log source answering from canned pages
///
/// Records every query it receives.
#[derive(Default)]
pub struct ScriptedTransfers {
    incoming: TransferPage,
    outgoing: TransferPage,
    failing: Option<QueryDirection>,
    hang: bool,
    queries: Mutex<Vec<TransferQuery>>,
}

impl ScriptedTransfers {
    pub fn new(incoming: Vec<RawTransfer>, outgoing: Vec<RawTransfer>) -> Self {
        Self {
            incoming: TransferPage::new(incoming),
            outgoing: TransferPage::new(outgoing),
            ..Self::default()
        }
    }

    /// Queries in `direction` fail as if the endpoint were down
    pub fn failing(mut self, direction: QueryDirection) -> Self {
        self.failing = Some(direction);
        self
    }

    /// Queries never complete
    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn queries(&self) -> Vec<TransferQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl TransferLogSource for ScriptedTransfers {
    async fn query_transfers(&self, query: &TransferQuery) -> Result<TransferPage, RpcError> {
        self.queries.lock().unwrap().push(query.clone());

        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.failing == Some(query.direction) {
            return Err(RpcError::unavailable(
                "alchemy_getAssetTransfers",
                std::io::Error::other("connection refused"),
            ));
        }

        Ok(match query.direction {
            QueryDirection::Incoming => self.incoming.clone(),
            QueryDirection::Outgoing => self.outgoing.clone(),
        })
    }
}

/// What the scripted transport answers with
#[derive(Debug, Clone)]
pub enum Reply {
    /// A well-formed envelope carrying `result`
    Result(Value),
    /// A well-formed envelope carrying an `error` member
    Error { code: i64, message: String },
    /// An envelope whose id does not match the request
    WrongId,
    /// The transport fails before any response arrives
    TransportFailure,
    /// No response ever arrives
    Hang,
}

impl Reply {
    async fn into_response(self, id: Id) -> Result<ResponsePacket, TransportError> {
        let body = match self {
            Reply::Result(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Reply::Error { code, message } => json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": { "code": code, "message": message },
            }),
            Reply::WrongId => json!({ "jsonrpc": "2.0", "id": 999_999, "result": null }),
            Reply::TransportFailure => {
                return Err(TransportErrorKind::custom_str("connection refused"))
            }
            Reply::Hang => {
                return std::future::pending::<Result<ResponsePacket, TransportError>>().await
            }
        };

        let text = body.to_string();
        serde_json::from_str(&text).map_err(|e| TransportError::deser_err(e, &text))
    }
}

/// A request seen by [`MockTransport`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub params: Value,
}

type Responder = dyn Fn(&str, &Value) -> Reply + Send + Sync;

/// Tower transport answering each request through a closure
///
/// The closure sees the method name and the decoded params. The response
/// echoes the request id unless the reply says otherwise.
#[derive(Clone)]
pub struct MockTransport {
    responder: Arc<Responder>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
    {
        Self {
            responder: Arc::new(responder),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Answers every request with the same reply
    pub fn always(reply: Reply) -> Self {
        Self::new(move |_, _| reply.clone())
    }

    /// Serves `eth_blockNumber` and `eth_getBlockByNumber` from `chain`,
    /// and asset transfer queries from `transfers`
    pub fn for_chain<F>(chain: Arc<SyntheticChain>, transfers: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        Self::new(move |method, params| match method {
            "eth_blockNumber" => Reply::Result(json!(format!("{:#x}", chain.head()))),
            "eth_getBlockByNumber" => {
                let block = params[0]
                    .as_str()
                    .and_then(|hex| u64::from_str_radix(hex.trim_start_matches("0x"), 16).ok())
                    .unwrap_or(u64::MAX);
                if block > chain.head() {
                    return Reply::Result(Value::Null);
                }
                Reply::Result(json!({
                    "number": format!("{block:#x}"),
                    "timestamp": format!("{:#x}", chain.timestamp_of(block).0),
                }))
            }
            "alchemy_getAssetTransfers" => Reply::Result(transfers(&params[0])),
            other => Reply::Error {
                code: -32601,
                message: format!("method {other} not found"),
            },
        })
    }

    /// What this transport would answer, without recording the request
    pub fn reply_to(&self, method: &str, params: &Value) -> Reply {
        (self.responder)(method, params)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Service<RequestPacket> for MockTransport {
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<ResponsePacket, TransportError>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, packet: RequestPacket) -> Self::Future {
        let RequestPacket::Single(request) = packet else {
            return Box::pin(async {
                Err(TransportErrorKind::custom_str("batch requests are not scripted"))
            });
        };

        let id = request.id().clone();
        let method = request.method().to_string();
        let params = request
            .params()
            .and_then(|raw| serde_json::from_str(raw.get()).ok())
            .unwrap_or(Value::Null);

        let reply = (self.responder)(&method, &params);
        self.requests
            .lock()
            .unwrap()
            .push(RecordedRequest { method, params });

        Box::pin(reply.into_response(id))
    }
}

/// An asset transfer as the endpoint encodes it
pub fn wire_transfer(block: BlockNumber, id: &str) -> Value {
    json!({
        "blockNum": format!("{block:#x}"),
        "uniqueId": id,
        "hash": format!("0x{block:064x}"),
        "from": "0x1111111111111111111111111111111111111111",
        "to": "0x2222222222222222222222222222222222222222",
        "value": 1.5,
        "asset": "PEPE",
        "category": "erc20",
        "rawContract": { "value": "0x14d1120d7b160000", "decimal": "0x12" },
    })
}

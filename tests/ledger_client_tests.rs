// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Integration tests for the JSON-RPC client
//!
//! These tests drive [`LedgerClient`] through a scripted tower transport and
//! check how each kind of response maps onto the error taxonomy.

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use alloy_primitives::{address, Address};
use blockspan::{
    ChainDataSource, Direction, ErrorKind, LedgerClient, QueryDirection, RpcError, ScanConfig,
    ScanRequest, SortOrder, TimeRange, TransferCategory, TransferLogSource, TransferQuery,
    TransferWindowScanner, UnixTimestamp,
};
use helpers::{wire_transfer, MockTransport, Reply, SyntheticChain, GENESIS};
use serde_json::json;

const TARGET: Address = address!("6982508145454ce325ddbe47a25d4ec3d2311933");

fn client(transport: MockTransport) -> LedgerClient<MockTransport> {
    LedgerClient::new(transport, Duration::from_secs(5))
}

fn query(direction: QueryDirection, max_count: u32) -> TransferQuery {
    TransferQuery {
        direction,
        address: TARGET,
        from_block: 100,
        to_block: 200,
        max_count,
        order: SortOrder::Desc,
        categories: vec![TransferCategory::Erc20],
    }
}

#[tokio::test]
async fn test_block_number_is_decoded_from_hex() {
    let transport = MockTransport::always(Reply::Result(json!("0x2710")));
    let head = client(transport.clone()).latest_block_number().await.unwrap();

    assert_eq!(head, 10_000);
    assert_eq!(transport.requests()[0].method, "eth_blockNumber");
}

#[tokio::test]
async fn test_block_timestamp_is_decoded() {
    let transport = MockTransport::always(Reply::Result(json!({
        "number": "0x10",
        "timestamp": "0x6553f100",
    })));

    let ts = client(transport.clone()).block_timestamp(16).await.unwrap();

    assert_eq!(ts, Some(UnixTimestamp(0x6553_f100)));
    let request = &transport.requests()[0];
    assert_eq!(request.method, "eth_getBlockByNumber");
    assert_eq!(request.params, json!(["0x10", false]));
}

#[tokio::test]
async fn test_null_block_is_not_found() {
    let transport = MockTransport::always(Reply::Result(serde_json::Value::Null));
    let ts = client(transport).block_timestamp(1).await.unwrap();
    assert_eq!(ts, None);
}

#[tokio::test]
async fn test_block_without_timestamp_is_malformed() {
    let transport = MockTransport::always(Reply::Result(json!({ "number": "0x1" })));
    let err = client(transport).block_timestamp(1).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_undecodable_result_is_malformed() {
    let transport = MockTransport::always(Reply::Result(json!({ "unexpected": true })));
    let err = client(transport).latest_block_number().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_mismatched_id_is_malformed() {
    let transport = MockTransport::always(Reply::WrongId);
    let err = client(transport).latest_block_number().await.unwrap_err();

    assert!(matches!(err, RpcError::MalformedResponse { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_error_member_becomes_error_response() {
    let transport = MockTransport::always(Reply::Error {
        code: -32000,
        message: "header not found".to_string(),
    });
    let err = client(transport).block_timestamp(1).await.unwrap_err();

    match err {
        RpcError::ErrorResponse { code, message, .. } => {
            assert_eq!(code, -32000);
            assert_eq!(message, "header not found");
        }
        other => panic!("expected error response, got {other:?}"),
    }
}

#[tokio::test]
async fn test_rate_limited_error_member_is_unavailable() {
    let transport = MockTransport::always(Reply::Error {
        code: 429,
        message: "Your app has exceeded its compute units per second capacity".to_string(),
    });
    let err = client(transport).block_timestamp(1).await.unwrap_err();

    assert!(matches!(err, RpcError::Throttled { code: 429, .. }));
    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_transport_failure_is_unavailable() {
    let transport = MockTransport::always(Reply::TransportFailure);
    let err = client(transport).latest_block_number().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::RemoteUnavailable);
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_hanging_call_times_out() {
    let transport = MockTransport::always(Reply::Hang);
    let err = client(transport).latest_block_number().await.unwrap_err();

    match err {
        RpcError::Timeout { after, .. } => assert_eq!(after, Duration::from_secs(5)),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn test_each_call_gets_a_fresh_id() {
    let transport = MockTransport::always(Reply::Result(json!("0x1")));
    let client = client(transport);

    // The mock echoes ids, so both calls only succeed if each id matches
    client.latest_block_number().await.unwrap();
    client.latest_block_number().await.unwrap();
}

#[tokio::test]
async fn test_asset_transfer_query_params() {
    let transport = MockTransport::always(Reply::Result(json!({ "transfers": [] })));
    client(transport.clone())
        .query_transfers(&query(QueryDirection::Incoming, 1000))
        .await
        .unwrap();

    let request = &transport.requests()[0];
    assert_eq!(request.method, "alchemy_getAssetTransfers");
    assert_eq!(
        request.params,
        json!([{
            "fromBlock": "0x64",
            "toBlock": "0xc8",
            "toAddress": "0x6982508145454ce325ddbe47a25d4ec3d2311933",
            "category": ["erc20"],
            "maxCount": "0x3e8",
            "order": "desc",
            "withMetadata": false,
        }])
    );
}

#[tokio::test]
async fn test_page_key_marks_page_truncated() {
    let transport = MockTransport::always(Reply::Result(json!({
        "transfers": [wire_transfer(150, "a"), wire_transfer(149, "b")],
        "pageKey": "9f3a1c",
    })));

    let page = client(transport)
        .query_transfers(&query(QueryDirection::Outgoing, 2))
        .await
        .unwrap();

    assert!(page.truncated);
    assert_eq!(page.records.len(), 2);
    assert_eq!(page.records[0].unique_id, "a");
    assert_eq!(page.records[0].block_number, 150);
}

#[tokio::test]
async fn test_oversized_page_is_cut_to_max_count() {
    let transport = MockTransport::always(Reply::Result(json!({
        "transfers": [
            wire_transfer(150, "a"),
            wire_transfer(149, "b"),
            wire_transfer(148, "c"),
        ],
    })));

    let page = client(transport)
        .query_transfers(&query(QueryDirection::Incoming, 2))
        .await
        .unwrap();

    assert!(page.truncated);
    let ids: Vec<_> = page.records.iter().map(|r| r.unique_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b"]);
}

#[tokio::test]
async fn test_full_page_without_page_key_is_complete() {
    let transport = MockTransport::always(Reply::Result(json!({
        "transfers": [wire_transfer(150, "a")],
    })));

    let page = client(transport)
        .query_transfers(&query(QueryDirection::Incoming, 1))
        .await
        .unwrap();

    assert!(!page.truncated);
}

#[tokio::test]
async fn test_scan_over_json_rpc() {
    let chain = Arc::new(SyntheticChain::new(GENESIS, 12, 10_000));
    let transport = MockTransport::for_chain(chain.clone(), |params| {
        if params.get("toAddress").is_some() {
            json!({ "transfers": [wire_transfer(9_500, "buy")] })
        } else {
            json!({ "transfers": [wire_transfer(9_400, "sell"), wire_transfer(8_000, "stale")] })
        }
    });
    let client = Arc::new(client(transport.clone()));
    let scanner = TransferWindowScanner::from_client(client, ScanConfig::default());

    let range = TimeRange::new(chain.timestamp_of(9_000), chain.timestamp_of(10_000)).unwrap();
    let result = scanner.scan(&ScanRequest::new(TARGET, range)).await.unwrap();

    assert_eq!(result.search_info.resolved_start_block, 9_000);
    assert_eq!(result.total_count, 2);
    assert_eq!(result.transfers[0].direction, Direction::Buy);
    assert_eq!(result.transfers[1].direction, Direction::Sell);
    assert_eq!(result.transfers[1].timestamp, chain.timestamp_of(9_400));

    let transfer_queries = transport
        .requests()
        .into_iter()
        .filter(|r| r.method == "alchemy_getAssetTransfers")
        .count();
    assert_eq!(transfer_queries, 2);
}

#[tokio::test]
async fn test_rate_limited_record_block_is_counted_unresolved() {
    let chain = Arc::new(SyntheticChain::new(GENESIS, 12, 10_000));
    let serving = MockTransport::for_chain(chain.clone(), |params| {
        if params.get("toAddress").is_some() {
            json!({ "transfers": [wire_transfer(9_500, "throttled"), wire_transfer(9_600, "ok")] })
        } else {
            json!({ "transfers": [] })
        }
    });
    // Block 9_500 is never visited by the search over 8_000..=10_000
    let transport = MockTransport::new(move |method, params| {
        if method == "eth_getBlockByNumber" && params[0] == json!("0x251c") {
            return Reply::Error {
                code: 429,
                message: "Too Many Requests".to_string(),
            };
        }
        serving.reply_to(method, params)
    });
    let scanner =
        TransferWindowScanner::from_client(Arc::new(client(transport)), ScanConfig::default());

    let range = TimeRange::new(chain.timestamp_of(9_000), chain.timestamp_of(10_000)).unwrap();
    let result = scanner.scan(&ScanRequest::new(TARGET, range)).await.unwrap();

    assert_eq!(result.total_count, 1);
    assert_eq!(result.transfers[0].transfer.unique_id, "ok");
    assert_eq!(result.search_info.unresolved_records, 1);
}

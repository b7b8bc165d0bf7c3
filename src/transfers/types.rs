// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transfer record types.
//!
//! [`RawTransfer`] is what the transfer-log endpoint returns; it carries no
//! timestamp. [`AnnotatedTransfer`] is only ever built by the window
//! aggregator once the record's block timestamp is known.

use std::fmt;
use std::str::FromStr;

use alloy_primitives::{Address, BlockNumber, TxHash, U256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blocks::UnixTimestamp;
use crate::errors::ConfigError;

/// Which side of a transfer the queried address is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryDirection {
    /// The address is the recipient
    Incoming,
    /// The address is the sender
    Outgoing,
}

impl QueryDirection {
    /// The tag records fetched in this direction receive
    pub fn tag(self) -> Direction {
        match self {
            QueryDirection::Incoming => Direction::Buy,
            QueryDirection::Outgoing => Direction::Sell,
        }
    }
}

impl fmt::Display for QueryDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryDirection::Incoming => f.write_str("incoming"),
            QueryDirection::Outgoing => f.write_str("outgoing"),
        }
    }
}

/// Direction tag of an annotated transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    /// The address received value
    Buy,
    /// The address sent value
    Sell,
}

/// Requested ordering by block (remote) or timestamp (merged output)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(ConfigError::invalid_setting(
                "order",
                format!("expected \"asc\" or \"desc\", got {other:?}"),
            )),
        }
    }
}

/// Transfer category as understood by `alchemy_getAssetTransfers`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferCategory {
    /// Top-level native-currency transfer
    External,
    /// Native-currency transfer from an internal call
    Internal,
    Erc20,
    Erc721,
    Erc1155,
    /// Pre-standard NFTs (CryptoPunks and similar)
    SpecialNft,
}

/// A transfer record as returned by the transfer-log endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransfer {
    pub block_number: BlockNumber,
    pub tx_hash: TxHash,
    pub from: Address,
    /// `None` for contract creations
    pub to: Option<Address>,
    pub category: TransferCategory,
    /// Decimal-adjusted amount as reported by the endpoint
    pub amount: Option<f64>,
    /// Asset symbol, when known
    pub asset: Option<String>,
    /// Amount in the asset's smallest unit, when known
    pub raw_amount: Option<U256>,
    /// Endpoint-assigned identifier, unique per transfer
    pub unique_id: String,
}

/// A raw transfer with its block timestamp and direction tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedTransfer {
    #[serde(flatten)]
    pub transfer: RawTransfer,
    pub timestamp: UnixTimestamp,
    /// `timestamp` rendered as UTC date-time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<DateTime<Utc>>,
    pub direction: Direction,
}

impl AnnotatedTransfer {
    pub(crate) fn new(transfer: RawTransfer, timestamp: UnixTimestamp, direction: Direction) -> Self {
        Self {
            transfer,
            timestamp,
            date: timestamp.to_datetime(),
            direction,
        }
    }
}

/// One page of records for one direction
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferPage {
    pub records: Vec<RawTransfer>,
    /// The endpoint reported more records than fit in this page
    pub truncated: bool,
}

impl TransferPage {
    pub fn new(records: Vec<RawTransfer>) -> Self {
        Self {
            records,
            truncated: false,
        }
    }
}

/// Raw results of the dual-direction fetch
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectionalTransfers {
    pub incoming: TransferPage,
    pub outgoing: TransferPage,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{address, b256};

    fn sample_transfer() -> RawTransfer {
        RawTransfer {
            block_number: 100,
            tx_hash: b256!("0000000000000000000000000000000000000000000000000000000000000001"),
            from: address!("1111111111111111111111111111111111111111"),
            to: Some(address!("2222222222222222222222222222222222222222")),
            category: TransferCategory::Erc20,
            amount: Some(1.5),
            asset: Some("PEPE".to_string()),
            raw_amount: Some(U256::from(1_500_000u64)),
            unique_id: "0x01:log:3".to_string(),
        }
    }

    #[test]
    fn test_direction_tags() {
        assert_eq!(QueryDirection::Incoming.tag(), Direction::Buy);
        assert_eq!(QueryDirection::Outgoing.tag(), Direction::Sell);
    }

    #[test]
    fn test_sort_order_parsing() {
        assert_eq!("asc".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!(" DESC ".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("newest".parse::<SortOrder>().is_err());
        assert_eq!(SortOrder::default(), SortOrder::Desc);
    }

    #[test]
    fn test_category_wire_names() {
        assert_eq!(
            serde_json::to_string(&TransferCategory::Erc1155).unwrap(),
            "\"erc1155\""
        );
        assert_eq!(
            serde_json::to_string(&TransferCategory::SpecialNft).unwrap(),
            "\"specialnft\""
        );
    }

    #[test]
    fn test_annotated_transfer_serialization() {
        let annotated =
            AnnotatedTransfer::new(sample_transfer(), UnixTimestamp(1_700_000_000), Direction::Buy);
        let json = serde_json::to_value(&annotated).unwrap();

        assert_eq!(json["blockNumber"], 100);
        assert_eq!(json["direction"], "BUY");
        assert_eq!(json["timestamp"], 1_700_000_000);
        assert_eq!(json["date"], "2023-11-14T22:13:20Z");
        assert_eq!(json["category"], "erc20");
        assert_eq!(json["uniqueId"], "0x01:log:3");
    }
}

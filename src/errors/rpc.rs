// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Shared RPC error types for the chain-data and transfer-log endpoints.
//!
//! Every remote round trip ends in one of three ways: a decoded value, a
//! successful-but-empty answer (modelled as `Option::None` by callers), or one
//! of the errors below.

use std::time::Duration;

use alloy_json_rpc::{ErrorPayload, RpcError as JsonRpcError};
use alloy_transport::TransportError;

/// Coarse classification of an [`RpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Transport failure or timeout. Retryable with bounded backoff.
    RemoteUnavailable,
    /// The response envelope or payload did not have the expected shape,
    /// or the endpoint answered with a populated error field.
    MalformedResponse,
    /// The request itself could not be encoded.
    InvalidRequest,
}

/// Errors that can occur during a single JSON-RPC round trip.
///
/// # Examples
///
/// ```rust
/// use blockspan::{ErrorKind, RpcError};
///
/// let error = RpcError::malformed("eth_blockNumber", "response id 7 does not match request id 3");
/// assert_eq!(error.kind(), ErrorKind::MalformedResponse);
/// assert!(!error.is_retryable());
/// ```
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The transport failed to deliver the request or the response.
    ///
    /// Connection resets, HTTP 5xx and rate limit rejections all end up here
    /// once the retry layer has given up.
    #[error("Remote endpoint unavailable during {method}")]
    Unavailable {
        /// JSON-RPC method that was being called
        method: String,
        /// The underlying transport error
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The call did not complete within the configured timeout.
    #[error("{method} timed out after {after:?}")]
    Timeout {
        /// JSON-RPC method that was being called
        method: String,
        /// The timeout that elapsed
        after: Duration,
    },

    /// The response violated the expected envelope or payload shape.
    ///
    /// Mismatched correlation ids, missing `result`/`error` members, and
    /// undecodable results are reported here. Never coerced into "not found".
    #[error("Malformed response to {method}: {details}")]
    MalformedResponse {
        /// JSON-RPC method that was being called
        method: String,
        /// What was wrong with the response
        details: String,
    },

    /// The endpoint answered with a populated `error` member.
    #[error("{method} failed with code {code}: {message}")]
    ErrorResponse {
        /// JSON-RPC method that was being called
        method: String,
        /// JSON-RPC error code
        code: i64,
        /// Error message reported by the endpoint
        message: String,
    },

    /// The endpoint rejected the call as over its rate limit.
    ///
    /// Reported through the `error` member (HTTP-style 429, or -32005 and
    /// similar capacity codes) but classified as unavailability.
    #[error("{method} throttled with code {code}: {message}")]
    Throttled {
        /// JSON-RPC method that was being called
        method: String,
        /// JSON-RPC error code
        code: i64,
        /// Error message reported by the endpoint
        message: String,
    },

    /// The request parameters could not be serialized.
    #[error("Failed to encode {method} request")]
    InvalidRequest {
        /// JSON-RPC method that was being encoded
        method: String,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },
}

impl RpcError {
    /// Helper to create an `Unavailable` error from any error type.
    pub fn unavailable(
        method: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RpcError::Unavailable {
            method: method.into(),
            source: Box::new(source),
        }
    }

    /// Helper to create a `Timeout` error.
    pub fn timeout(method: impl Into<String>, after: Duration) -> Self {
        RpcError::Timeout {
            method: method.into(),
            after,
        }
    }

    /// Helper to create a `MalformedResponse` error.
    pub fn malformed(method: impl Into<String>, details: impl Into<String>) -> Self {
        RpcError::MalformedResponse {
            method: method.into(),
            details: details.into(),
        }
    }

    /// Maps an alloy transport error onto this taxonomy.
    ///
    /// Deserialization failures and null responses are malformed; everything
    /// coming out of the transport itself is treated as unavailability.
    pub fn from_transport(method: impl Into<String>, error: TransportError) -> Self {
        let method = method.into();
        match error {
            JsonRpcError::DeserError { err, text } => RpcError::MalformedResponse {
                method,
                details: format!("{err} (body: {})", truncate(&text, 256)),
            },
            JsonRpcError::NullResp => RpcError::malformed(method, "null response packet"),
            JsonRpcError::ErrorResp(payload) => RpcError::from_error_payload(method, &payload),
            JsonRpcError::SerError(source) => RpcError::InvalidRequest { method, source },
            other => RpcError::Unavailable {
                method,
                source: Box::new(other),
            },
        }
    }

    /// Maps a populated `error` member onto this taxonomy.
    ///
    /// Rate limit rejections become [`RpcError::Throttled`]; every other code
    /// is an [`RpcError::ErrorResponse`].
    pub fn from_error_payload(method: impl Into<String>, payload: &ErrorPayload) -> Self {
        let method = method.into();
        let code = payload.code;
        let message = payload.message.to_string();
        if payload.is_retry_err() {
            RpcError::Throttled {
                method,
                code,
                message,
            }
        } else {
            RpcError::ErrorResponse {
                method,
                code,
                message,
            }
        }
    }

    /// Returns the coarse classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Unavailable { .. } | RpcError::Timeout { .. } | RpcError::Throttled { .. } => {
                ErrorKind::RemoteUnavailable
            }
            RpcError::MalformedResponse { .. } | RpcError::ErrorResponse { .. } => {
                ErrorKind::MalformedResponse
            }
            RpcError::InvalidRequest { .. } => ErrorKind::InvalidRequest,
        }
    }

    /// Whether retrying the same request could succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::RemoteUnavailable
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based logging layer for JSON-RPC transports.
//!
//! Records method, duration, and failures of every round trip with
//! `tracing`. A response carrying a populated `error` member is logged as a
//! failure too, even though the transport itself succeeded.

use std::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
    time::Instant,
};

use alloy_json_rpc::{RequestPacket, ResponsePacket, ResponsePayload};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, trace, warn, Instrument};

use crate::spans;

/// A Tower layer that adds logging/tracing to RPC requests.
///
/// # Example
///
/// ```rust
/// use blockspan::transport::LoggingLayer;
///
/// // Timing and errors only
/// let layer = LoggingLayer::new();
///
/// // Also dump request and response packets at trace level
/// let layer = LoggingLayer::new().verbose();
/// ```
#[derive(Clone, Debug, Default)]
pub struct LoggingLayer {
    log_payloads: bool,
}

impl LoggingLayer {
    /// Creates a new logging layer that logs timing and errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs full request and response packets at `trace` level.
    ///
    /// Transfer pages can be large; keep this off outside debugging.
    pub fn verbose(mut self) -> Self {
        self.log_payloads = true;
        self
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = LoggingService<S>;

    fn layer(&self, service: S) -> Self::Service {
        LoggingService {
            service,
            log_payloads: self.log_payloads,
        }
    }
}

/// A Tower service that logs RPC requests and responses.
#[derive(Clone, Debug)]
pub struct LoggingService<S> {
    service: S,
    log_payloads: bool,
}

impl<S> tower::Service<RequestPacket> for LoggingService<S>
where
    S: tower::Service<RequestPacket, Response = ResponsePacket, Error = TransportError>
        + Clone
        + Send
        + 'static,
    S::Future: Send,
{
    type Response = ResponsePacket;
    type Error = TransportError;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: RequestPacket) -> Self::Future {
        let log_payloads = self.log_payloads;
        let mut service = self.service.clone();
        let method = method_name(&request);
        let span = spans::rpc_call(&method);

        Box::pin(
            async move {
                let start = Instant::now();

                if log_payloads {
                    trace!(request = ?request, "RPC request");
                }

                let result = service.call(request).await;
                let duration_ms = start.elapsed().as_millis() as u64;
                tracing::Span::current().record("duration_ms", duration_ms);

                match &result {
                    Ok(response) => {
                        if let Some((code, message)) = first_error(response) {
                            warn!(code, message, duration_ms, "RPC error response: {method}");
                        } else {
                            debug!(duration_ms, "RPC response: {method}");
                        }
                        if log_payloads {
                            trace!(response = ?response, "RPC response");
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, duration_ms, "RPC transport error: {method}");
                    }
                }

                result
            }
            .instrument(span),
        )
    }
}

/// The RPC method name of a request packet.
pub(crate) fn method_name(request: &RequestPacket) -> String {
    match request {
        RequestPacket::Single(req) => req.method().to_string(),
        RequestPacket::Batch(reqs) => match reqs.as_slice() {
            [] => "batch(empty)".to_string(),
            [only] => only.method().to_string(),
            many => format!("batch({} calls)", many.len()),
        },
    }
}

fn first_error(response: &ResponsePacket) -> Option<(i64, &str)> {
    match response {
        ResponsePacket::Single(resp) => payload_error(&resp.payload),
        ResponsePacket::Batch(resps) => resps.iter().find_map(|resp| payload_error(&resp.payload)),
    }
}

fn payload_error(payload: &ResponsePayload) -> Option<(i64, &str)> {
    match payload {
        ResponsePayload::Failure(e) => Some((e.code, e.message.as_ref())),
        ResponsePayload::Success(_) => None,
    }
}

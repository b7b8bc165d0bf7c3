// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based retry layer with exponential backoff for JSON-RPC transports.
//!
//! Only failures that mean "the endpoint was unavailable" are retried:
//! connection errors, HTTP 429/5xx, and error payloads whose code marks them
//! as transient (rate limiting). A response that arrived but could not be
//! decoded is never retried. All calls made by this crate are idempotent
//! reads, so replaying a request is always safe.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use alloy_json_rpc::{RequestPacket, ResponsePacket, ResponsePayload, RpcError};
use alloy_transport::TransportError;
use tower::Layer;
use tracing::{debug, warn};

use super::logging::method_name;

/// Default maximum number of retry attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(100);
const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// A Tower layer that retries transient RPC failures with exponential backoff.
///
/// ```text
/// delay = min(base_delay * 2^attempt, max_delay)
/// ```
///
/// # Example
///
/// ```rust
/// use blockspan::transport::RetryLayer;
/// use std::time::Duration;
///
/// // Retry up to 3 times with exponential backoff
/// let layer = RetryLayer::new();
///
/// // Or with custom configuration
/// let layer = RetryLayer::builder()
///     .max_retries(5)
///     .base_delay(Duration::from_millis(200))
///     .max_delay(Duration::from_secs(60))
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct RetryLayer {
    config: Arc<RetryConfig>,
}

/// Configuration for retry behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial request).
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryLayer {
    /// 3 retries, 100ms base delay, 30s maximum delay.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> RetryLayerBuilder {
        RetryLayerBuilder::new()
    }

    /// Default delays with a specific number of retries.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self::builder().max_retries(max_retries).build()
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}

impl Default for RetryLayer {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> Layer<S> for RetryLayer {
    type Service = RetryService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RetryService {
            service,
            config: self.config.clone(),
        }
    }
}

/// Builder for configuring a [`RetryLayer`].
#[derive(Clone, Debug, Default)]
pub struct RetryLayerBuilder {
    config: RetryConfig,
}

impl RetryLayerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum retries (not including the initial request).
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the delay before the first retry.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.config.base_delay = delay;
        self
    }

    /// Caps the delay between retries.
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.config.max_delay = delay;
        self
    }

    pub fn build(self) -> RetryLayer {
        RetryLayer {
            config: Arc::new(self.config),
        }
    }
}

/// A Tower service that retries transient failures of the inner service.
#[derive(Clone, Debug)]
pub struct RetryService<S> {
    service: S,
    config: Arc<RetryConfig>,
}

impl<S> tower::Service<RequestPacket> for RetryService<S>
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
        let service = self.service.clone();
        let config = self.config.clone();

        Box::pin(async move {
            let mut attempt = 0u32;
            loop {
                let result = service.clone().call(request.clone()).await;

                let reason = match &result {
                    Ok(response) if response_is_transient(response) => "transient error payload",
                    Ok(_) => {
                        if attempt > 0 {
                            debug!(attempt, "Request succeeded after retry");
                        }
                        return result;
                    }
                    Err(error) if is_retryable_error(error) => "transport error",
                    Err(error) => {
                        debug!(error = %error, "Non-retryable error, not retrying");
                        return result;
                    }
                };

                if attempt >= config.max_retries {
                    warn!(
                        method = %method_name(&request),
                        attempts = attempt + 1,
                        reason,
                        "Max retries exceeded"
                    );
                    return result;
                }

                let delay = calculate_backoff(attempt, &config);
                warn!(
                    method = %method_name(&request),
                    attempt = attempt + 1,
                    max_retries = config.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    reason,
                    "Retryable failure, backing off"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        })
    }
}

/// `min(base_delay * 2^attempt, max_delay)`
fn calculate_backoff(attempt: u32, config: &RetryConfig) -> Duration {
    let multiplier = 2u128.saturating_pow(attempt);
    let delay_ms = config.base_delay.as_millis().saturating_mul(multiplier);
    let capped_ms = delay_ms.min(config.max_delay.as_millis());
    Duration::from_millis(u64::try_from(capped_ms).unwrap_or(u64::MAX))
}

/// Whether a transport-level failure may succeed on retry.
///
/// Deserialization failures are not retried: the endpoint answered, the
/// answer just had the wrong shape, and replaying would return it again.
fn is_retryable_error(error: &TransportError) -> bool {
    match error {
        RpcError::Transport(kind) => kind.is_retry_err(),
        RpcError::ErrorResp(payload) => payload.is_retry_err(),
        RpcError::NullResp => true,
        _ => false,
    }
}

/// Whether a delivered response carries an error payload marked transient.
fn response_is_transient(response: &ResponsePacket) -> bool {
    let transient = |payload: &ResponsePayload| {
        matches!(payload, ResponsePayload::Failure(e) if e.is_retry_err())
    };
    match response {
        ResponsePacket::Single(resp) => transient(&resp.payload),
        ResponsePacket::Batch(resps) => resps.iter().any(|resp| transient(&resp.payload)),
    }
}

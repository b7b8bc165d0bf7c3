// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Tower-based rate limiting layer for JSON-RPC transports.
//!
//! A token bucket shared by every clone of the layer, so all calls of one
//! scan (binary search probes, both transfer queries, and the concurrent
//! timestamp lookups of aggregation) draw from the same budget.

use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use tokio::sync::Mutex;
use tokio::time::Instant;
use tower::Layer;
use tracing::trace;

/// A Tower layer that applies rate limiting to requests.
///
/// Tokens are replenished at a fixed rate and each request consumes one. If
/// no token is available the request waits. A disabled layer passes requests
/// straight through.
///
/// # Example
///
/// ```rust
/// use blockspan::transport::RateLimitLayer;
/// use std::time::Duration;
///
/// // 25 requests per second
/// let layer = RateLimitLayer::per_second(25);
///
/// // 100 requests per minute
/// let layer = RateLimitLayer::new(100, Duration::from_secs(60));
///
/// // From optional configuration
/// let layer = RateLimitLayer::from_config(None);
/// assert!(!layer.is_enabled());
/// ```
#[derive(Clone, Debug)]
pub struct RateLimitLayer {
    state: Option<Arc<Mutex<RateLimitState>>>,
}

impl RateLimitLayer {
    /// Allows `requests` per `period`, bursting up to `requests`.
    ///
    /// A zero `requests` or `period` yields a disabled layer.
    pub fn new(requests: u32, period: Duration) -> Self {
        if requests == 0 || period.is_zero() {
            return Self::disabled();
        }
        Self {
            state: Some(Arc::new(Mutex::new(RateLimitState::new(requests, period)))),
        }
    }

    /// Allows `requests` per second.
    pub fn per_second(requests: u32) -> Self {
        Self::new(requests, Duration::from_secs(1))
    }

    /// A layer that never delays requests.
    pub fn disabled() -> Self {
        Self { state: None }
    }

    /// Per-second limit if configured, pass-through otherwise.
    pub fn from_config(requests_per_second: Option<u32>) -> Self {
        requests_per_second.map_or_else(Self::disabled, Self::per_second)
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_some()
    }
}

impl<S> Layer<S> for RateLimitLayer {
    type Service = RateLimitService<S>;

    fn layer(&self, service: S) -> Self::Service {
        RateLimitService {
            service,
            state: self.state.clone(),
        }
    }
}

/// Token bucket state.
#[derive(Debug)]
struct RateLimitState {
    capacity: u32,
    tokens: f64,
    /// Tokens per nanosecond
    refill_rate: f64,
    last_refill: Instant,
}

impl RateLimitState {
    fn new(requests: u32, period: Duration) -> Self {
        Self {
            capacity: requests,
            tokens: requests as f64,
            refill_rate: requests as f64 / period.as_nanos() as f64,
            last_refill: Instant::now(),
        }
    }

    /// Takes a token, or returns how long until one is available.
    fn try_acquire(&mut self) -> Option<Duration> {
        self.refill();

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            None
        } else {
            let needed = 1.0 - self.tokens;
            Some(Duration::from_nanos((needed / self.refill_rate).ceil() as u64))
        }
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill);
        let new_tokens = elapsed.as_nanos() as f64 * self.refill_rate;

        self.tokens = (self.tokens + new_tokens).min(self.capacity as f64);
        self.last_refill = now;
    }
}

/// A Tower service that applies rate limiting to requests.
#[derive(Clone, Debug)]
pub struct RateLimitService<S> {
    service: S,
    state: Option<Arc<Mutex<RateLimitState>>>,
}

impl<S, Request> tower::Service<Request> for RateLimitService<S>
where
    S: tower::Service<Request> + Clone + Send + 'static,
    S::Future: Send,
    Request: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let state = self.state.clone();
        let mut service = self.service.clone();

        Box::pin(async move {
            if let Some(state) = state {
                loop {
                    let wait = state.lock().await.try_acquire();
                    match wait {
                        None => break,
                        Some(duration) => {
                            trace!(wait_ms = duration.as_millis() as u64, "Rate limited");
                            tokio::time::sleep(duration).await;
                        }
                    }
                }
            }

            service.call(request).await
        })
    }
}

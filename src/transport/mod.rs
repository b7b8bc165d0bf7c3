// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Transport layer utilities for the JSON-RPC ledger client.
//!
//! Tower middleware wrapped around the HTTP transport. The production stack,
//! outermost first, is:
//!
//! ```text
//! LoggingLayer -> RetryLayer -> RateLimitLayer -> Http<reqwest::Client>
//! ```
//!
//! Logging sees each logical call once, including its retries; every retry
//! attempt draws a fresh token from the rate limiter.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use blockspan::transport::{LoggingLayer, RateLimitLayer, RetryLayer};
//! use alloy_transport_http::Http;
//! use tower::ServiceBuilder;
//!
//! let transport = ServiceBuilder::new()
//!     .layer(LoggingLayer::new())
//!     .layer(RetryLayer::with_max_retries(3))
//!     .layer(RateLimitLayer::per_second(25))
//!     .service(Http::new(rpc_url));
//! ```

mod logging;
mod rate_limit;
mod retry;

pub use logging::{LoggingLayer, LoggingService};
pub use rate_limit::{RateLimitLayer, RateLimitService};
pub use retry::{RetryConfig, RetryLayer, RetryLayerBuilder, RetryService, DEFAULT_MAX_RETRIES};

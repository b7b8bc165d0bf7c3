// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Block range resolution for wall-clock windows.
//!
//! This module provides functionality for:
//! - Resolving block numbers to timestamps with per-run memoization
//! - Estimating a search interval and binary searching it for a window start
//! - Caching block timestamps with multiple backends

pub mod cache;
pub mod oracle;
pub mod window;

// Re-export public API
pub use cache::{CacheStats, MemoryCache, NoOpCache, TimestampCache};
pub use oracle::{BlockTimestampOracle, ChainDataSource};
pub use window::*;

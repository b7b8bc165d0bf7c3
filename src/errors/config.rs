// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Configuration errors.
//!
//! All of these are raised before any remote call is made and are never
//! worth retrying.

/// Errors raised while loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No endpoint URL was supplied.
    #[error("Missing RPC endpoint: set {variable}")]
    MissingEndpoint {
        /// Environment variable that was expected to hold the endpoint
        variable: String,
    },

    /// The endpoint URL could not be parsed.
    #[error("Invalid RPC endpoint URL {url:?}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// The underlying parse error
        #[source]
        source: url::ParseError,
    },

    /// A required setting is missing.
    #[error("Missing required setting {name}")]
    MissingSetting {
        /// Name of the setting
        name: String,
    },

    /// A setting has a value outside its allowed domain.
    #[error("Invalid value for {name}: {reason}")]
    InvalidSetting {
        /// Name of the setting
        name: String,
        /// Why the value was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Create an `InvalidSetting` error.
    pub fn invalid_setting(name: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::InvalidSetting {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

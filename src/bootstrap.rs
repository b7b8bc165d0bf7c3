// SPDX-FileCopyrightText: 2025 Semiotic AI, Inc.
//
// SPDX-License-Identifier: Apache-2.0

//! Command-line entry point
//!
//! Settings come from the environment (a `.env` file is honoured):
//!
//! | Variable                | Required | Default                  |
//! |-------------------------|----------|--------------------------|
//! | `ALCHEMY_RPC_URL`       | yes      |                          |
//! | `TARGET_ADDRESS`        | yes      |                          |
//! | `LOOKBACK`              | no       | `24h`                    |
//! | `ORDER`                 | no       | `desc`                   |
//! | `MAX_COUNT`             | no       | `1000`                   |
//! | `CHAIN`                 | no       | 12 s average block time  |
//! | `RATE_LIMIT_PER_SECOND` | no       | unlimited                |
//!
//! `LOOKBACK` takes a count with a unit suffix: `m` minutes, `h` hours,
//! `d` days or `w` weeks (`90m`, `24h`, `7d`, `2w`). A bare count is hours.
//! The older `LOOKBACK_HOURS` is still read when `LOOKBACK` is unset.
//!
//! The result is printed to stdout as pretty JSON. Ctrl-C abandons the scan.

use std::str::FromStr;
use std::sync::Arc;

use alloy_chains::NamedChain;
use alloy_primitives::Address;
use chrono::TimeDelta;
use tracing::info;

use crate::{
    create_ledger_client, ConfigError, ProviderConfig, ScanConfig, ScanRequest, SortOrder,
    TransferWindowScanner,
};

const DEFAULT_LOOKBACK_HOURS: i64 = 24;

/// How far back from now the scanned window reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lookback(pub TimeDelta);

impl Default for Lookback {
    fn default() -> Self {
        Self(TimeDelta::hours(DEFAULT_LOOKBACK_HOURS))
    }
}

impl FromStr for Lookback {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
        let (count, unit) = s.split_at(split);
        let count: i64 = count
            .parse()
            .map_err(|_| "expected a count such as 90m, 24h, 7d or 2w".to_string())?;
        if count == 0 {
            return Err("lookback must be positive".to_string());
        }
        let span = match unit {
            "m" => TimeDelta::try_minutes(count),
            "" | "h" => TimeDelta::try_hours(count),
            "d" => TimeDelta::try_days(count),
            "w" => TimeDelta::try_weeks(count),
            other => return Err(format!("unknown unit {other:?}, expected m, h, d or w")),
        };
        span.map(Self).ok_or_else(|| "lookback is too large".to_string())
    }
}

/// Settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct CliSettings {
    pub address: Address,
    pub lookback: Lookback,
    pub order: Option<SortOrder>,
    pub max_count: Option<u32>,
    pub chain: Option<NamedChain>,
    pub rate_limit_per_second: Option<u32>,
}

impl CliSettings {
    /// Reads every setting through `lookup`, so tests need not touch the
    /// process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let address = lookup("TARGET_ADDRESS").ok_or_else(|| ConfigError::MissingSetting {
            name: "TARGET_ADDRESS".to_string(),
        })?;

        Ok(Self {
            address: parse_setting("TARGET_ADDRESS", &address)?,
            lookback: match optional(&lookup, "LOOKBACK")? {
                Some(lookback) => lookback,
                None => optional(&lookup, "LOOKBACK_HOURS")?
                    .map(|hours: u32| Lookback(TimeDelta::hours(i64::from(hours))))
                    .unwrap_or_default(),
            },
            order: optional(&lookup, "ORDER")?,
            max_count: optional(&lookup, "MAX_COUNT")?,
            chain: optional(&lookup, "CHAIN")?,
            rate_limit_per_second: optional(&lookup, "RATE_LIMIT_PER_SECOND")?,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| dotenvy::var(name).ok())
    }

    pub fn scan_config(&self) -> ScanConfig {
        self.chain.map(ScanConfig::for_chain).unwrap_or_default()
    }
}

fn optional<F, T>(lookup: &F, name: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .filter(|value| !value.trim().is_empty())
        .map(|value| parse_setting(name, &value))
        .transpose()
}

fn parse_setting<T>(name: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid_setting(name, format!("{value:?}: {e}")))
}

/// Main entry point for the application.
pub async fn run() -> anyhow::Result<()> {
    let settings = CliSettings::from_env()?;
    let provider_config =
        ProviderConfig::from_env()?.with_rate_limit_opt(settings.rate_limit_per_second);

    let client = Arc::new(create_ledger_client(&provider_config)?);
    let scanner = TransferWindowScanner::from_client(client, settings.scan_config());

    let mut request = ScanRequest::last(settings.address, settings.lookback.0)?;
    request.order = settings.order;
    request.max_count = settings.max_count;

    info!(
        address = %request.address,
        start = %request.range.start(),
        end = %request.range.end(),
        "Scanning transfer window"
    );

    let result = scanner
        .scan_until(&request, async {
            // If the signal handler cannot be installed, never cancel
            if tokio::signal::ctrl_c().await.is_err() {
                std::future::pending::<()>().await;
            }
        })
        .await?;

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = CliSettings::from_lookup(lookup(&[(
            "TARGET_ADDRESS",
            "0x6982508145454ce325ddbe47a25d4ec3d2311933",
        )]))
        .unwrap();

        assert_eq!(settings.lookback, Lookback(TimeDelta::hours(24)));
        assert_eq!(settings.order, None);
        assert_eq!(settings.max_count, None);
        assert_eq!(settings.scan_config(), ScanConfig::default());
    }

    #[test]
    fn test_all_settings() {
        let settings = CliSettings::from_lookup(lookup(&[
            ("TARGET_ADDRESS", "0x6982508145454ce325ddbe47a25d4ec3d2311933"),
            ("LOOKBACK", "7d"),
            ("ORDER", "asc"),
            ("MAX_COUNT", "250"),
            ("CHAIN", "mainnet"),
            ("RATE_LIMIT_PER_SECOND", "10"),
        ]))
        .unwrap();

        assert_eq!(settings.lookback, Lookback(TimeDelta::days(7)));
        assert_eq!(settings.order, Some(SortOrder::Asc));
        assert_eq!(settings.max_count, Some(250));
        assert_eq!(settings.chain, Some(NamedChain::Mainnet));
        assert_eq!(settings.rate_limit_per_second, Some(10));
    }

    #[test]
    fn test_lookback_units() {
        let parse = |s: &str| s.parse::<Lookback>().map(|l| l.0);

        assert_eq!(parse("5m"), Ok(TimeDelta::minutes(5)));
        assert_eq!(parse("24h"), Ok(TimeDelta::hours(24)));
        assert_eq!(parse("36"), Ok(TimeDelta::hours(36)));
        assert_eq!(parse(" 7d "), Ok(TimeDelta::days(7)));
        assert_eq!(parse("2w"), Ok(TimeDelta::weeks(2)));

        assert!(parse("0h").is_err());
        assert!(parse("h").is_err());
        assert!(parse("-5m").is_err());
        assert!(parse("3y").is_err());
        assert!(parse("1.5h").is_err());
        assert!(parse("99999999999999w").is_err());
    }

    #[test]
    fn test_lookback_hours_fallback() {
        let settings = CliSettings::from_lookup(lookup(&[
            ("TARGET_ADDRESS", "0x6982508145454ce325ddbe47a25d4ec3d2311933"),
            ("LOOKBACK_HOURS", "6"),
        ]))
        .unwrap();
        assert_eq!(settings.lookback, Lookback(TimeDelta::hours(6)));

        let settings = CliSettings::from_lookup(lookup(&[
            ("TARGET_ADDRESS", "0x6982508145454ce325ddbe47a25d4ec3d2311933"),
            ("LOOKBACK", "90m"),
            ("LOOKBACK_HOURS", "6"),
        ]))
        .unwrap();
        assert_eq!(settings.lookback, Lookback(TimeDelta::minutes(90)));
    }

    #[test]
    fn test_missing_address() {
        let err = CliSettings::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingSetting { .. }));
    }

    #[test]
    fn test_invalid_values_name_the_setting() {
        let err = CliSettings::from_lookup(lookup(&[
            ("TARGET_ADDRESS", "0x6982508145454ce325ddbe47a25d4ec3d2311933"),
            ("LOOKBACK", "yesterday"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("LOOKBACK"));

        let err = CliSettings::from_lookup(lookup(&[("TARGET_ADDRESS", "0x1234")])).unwrap_err();
        assert!(err.to_string().contains("TARGET_ADDRESS"));
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::utils::parse_decimal;
use anyhow::{Context, Result, anyhow};
use chrono::Duration;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::path::PathBuf;

pub const DEFAULT_BALANCE: Decimal = dec!(100000);
pub const DEFAULT_QUOTE_ENDPOINT: &str = "https://finnhub.io/api/v1/quote";

/// Live quotes are never requested more often than this.
pub const MIN_LIVE_INTERVAL_SECS: i64 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedMode {
    Simulated,
    Live,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub default_balance: Decimal,
    pub tick_interval: Duration,
    pub live_interval: Duration,
    /// Equity random-walk cadence while live quotes are active.
    pub demo_interval: Duration,
    pub quote_endpoint: String,
    pub quote_api_key: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub feed: FeedMode,
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_balance: DEFAULT_BALANCE,
            tick_interval: Duration::seconds(1),
            live_interval: Duration::seconds(MIN_LIVE_INTERVAL_SECS),
            demo_interval: Duration::seconds(4),
            quote_endpoint: DEFAULT_QUOTE_ENDPOINT.to_string(),
            quote_api_key: None,
            data_dir: None,
            feed: FeedMode::Simulated,
            seed: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|k| std::env::var(k).ok())
    }

    /// Reads `SIPFOLIO_*` keys through `get`, falling back to defaults.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Config::default();
        if let Some(v) = get("SIPFOLIO_DEFAULT_BALANCE") {
            let bal = parse_decimal(&v).context("SIPFOLIO_DEFAULT_BALANCE")?;
            if bal < Decimal::ZERO {
                return Err(anyhow!("SIPFOLIO_DEFAULT_BALANCE must not be negative"));
            }
            cfg.default_balance = bal;
        }
        if let Some(v) = get("SIPFOLIO_TICK_MS") {
            let ms: i64 = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid SIPFOLIO_TICK_MS '{}'", v))?;
            if ms <= 0 {
                return Err(anyhow!("SIPFOLIO_TICK_MS must be positive"));
            }
            cfg.tick_interval = Duration::milliseconds(ms);
        }
        if let Some(v) = get("SIPFOLIO_LIVE_SECS") {
            let secs: i64 = v
                .trim()
                .parse()
                .with_context(|| format!("Invalid SIPFOLIO_LIVE_SECS '{}'", v))?;
            cfg.live_interval = Duration::seconds(secs.max(MIN_LIVE_INTERVAL_SECS));
        }
        if let Some(v) = get("SIPFOLIO_QUOTE_ENDPOINT") {
            cfg.quote_endpoint = v.trim().to_string();
        }
        cfg.quote_api_key = get("SIPFOLIO_QUOTE_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        cfg.data_dir = get("SIPFOLIO_DATA_DIR").map(PathBuf::from);
        if let Some(v) = get("SIPFOLIO_FEED") {
            cfg.feed = match v.trim().to_lowercase().as_str() {
                "simulated" | "sim" => FeedMode::Simulated,
                "live" => FeedMode::Live,
                other => return Err(anyhow!("Unknown feed '{}', expected simulated|live", other)),
            };
        }
        if let Some(v) = get("SIPFOLIO_SEED") {
            cfg.seed = Some(
                v.trim()
                    .parse()
                    .with_context(|| format!("Invalid SIPFOLIO_SEED '{}'", v))?,
            );
        }
        Ok(cfg)
    }
}

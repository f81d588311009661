// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Price sources. Both providers own a [`Catalog`] and expose the same
//! read/advance surface; which one runs is decided by configuration.

pub mod live;
pub mod simulated;

pub use live::{FinnhubClient, LiveFeed, QuoteClient};
pub use simulated::SimulatedFeed;

use crate::catalog::Catalog;
use crate::config::{Config, FeedMode};
use crate::models::Timeframe;
use anyhow::Result;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

pub trait PriceSource {
    fn catalog(&self) -> &Catalog;

    /// Moves the feed forward to `now`.
    fn advance(&mut self, now: DateTime<Utc>);

    fn name(&self) -> &'static str;

    /// Turns real quotes on or off. Feeds without a quote source ignore it.
    fn set_live_enabled(&mut self, _enabled: bool) {}

    /// Latest point of the instrument's series for `tf`.
    fn current_price(&self, id: &str, tf: Timeframe) -> Option<Decimal> {
        self.catalog().get(id).and_then(|i| i.latest(tf))
    }

    /// Oldest-first series for `tf`, at most `HISTORY_CAP` points.
    fn history(&self, id: &str, tf: Timeframe) -> Option<&[Decimal]> {
        self.catalog()
            .get(id)
            .and_then(|i| i.history(tf))
            .map(|h| h.points())
    }
}

/// Builds the configured feed over `catalog`. Live mode without a quote
/// credential falls back to the simulator.
pub fn build_feed(
    config: &Config,
    catalog: Catalog,
    api_key: Option<&str>,
) -> Result<Box<dyn PriceSource>> {
    let sim = SimulatedFeed::new(catalog, config.seed);
    match (config.feed, api_key.filter(|k| !k.trim().is_empty())) {
        (FeedMode::Simulated, _) => Ok(Box::new(sim)),
        (FeedMode::Live, Some(key)) => {
            let client = FinnhubClient::new(&config.quote_endpoint, key)?;
            let feed = LiveFeed::new(sim, Arc::new(client), config.live_interval, config.demo_interval)?;
            Ok(Box::new(feed))
        }
        (FeedMode::Live, None) => {
            warn!("live feed requested without a quote API key; using simulated prices");
            Ok(Box::new(sim))
        }
    }
}

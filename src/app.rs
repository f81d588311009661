// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::catalog::Catalog;
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, FeedMode};
use crate::ledger::Ledger;
use crate::pricing::{PriceSource, build_feed};
use crate::store::{MemoryStore, SqliteStore, Store};
use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tracing::warn;

/// Explicit handle bundling the ledger with the price feed it trades against.
pub struct App {
    pub config: Config,
    pub clock: Arc<dyn Clock>,
    pub ledger: Ledger,
    pub feed: Box<dyn PriceSource>,
}

impl App {
    /// Opens the on-disk store (falling back to memory) and builds the configured feed.
    pub fn open(config: Config) -> Result<Self> {
        let store: Box<dyn Store> = match SqliteStore::open_or_init(config.data_dir.as_deref()) {
            Ok(s) => Box::new(s),
            Err(e) => {
                warn!(error = %e, "persistent store unavailable; this session will not be saved");
                Box::new(MemoryStore::new())
            }
        };
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = Ledger::open(store, clock.clone(), config.default_balance);
        let mut rng = match config.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let catalog = Catalog::seeded(&mut rng);
        Self::assemble(config, clock, ledger, catalog)
    }

    /// Builds an app over explicit parts; used by tests and embedders.
    pub fn with_parts(
        config: Config,
        clock: Arc<dyn Clock>,
        store: Box<dyn Store>,
        catalog: Catalog,
    ) -> Result<Self> {
        let ledger = Ledger::open(store, clock.clone(), config.default_balance);
        Self::assemble(config, clock, ledger, catalog)
    }

    fn assemble(
        mut config: Config,
        clock: Arc<dyn Clock>,
        ledger: Ledger,
        catalog: Catalog,
    ) -> Result<Self> {
        let prefs = ledger.prefs();
        if prefs.live_enabled {
            config.feed = FeedMode::Live;
        }
        let api_key = prefs
            .quote_api_key
            .clone()
            .or_else(|| config.quote_api_key.clone());
        let feed = build_feed(&config, catalog, api_key.as_deref())?;
        Ok(Self {
            config,
            clock,
            ledger,
            feed,
        })
    }

    /// Reborrows the ledger and the feed together.
    pub fn parts(&mut self) -> (&mut Ledger, &mut dyn PriceSource) {
        (&mut self.ledger, self.feed.as_mut())
    }
}

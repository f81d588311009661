// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::PriceSource;
use crate::catalog::{Catalog, perturbation, walk_step};
use crate::models::{InstrumentKind, Timeframe};
use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Random-walk generator. The primary series moves every tick; slower
/// series move every `Timeframe::cadence()` ticks with narrower steps.
#[derive(Debug, Clone)]
pub struct SimulatedFeed {
    catalog: Catalog,
    rng: StdRng,
    equity_ticks: u64,
    fund_ticks: u64,
}

impl SimulatedFeed {
    pub fn new(catalog: Catalog, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            catalog,
            rng,
            equity_ticks: 0,
            fund_ticks: 0,
        }
    }

    /// Standard universe with seeded histories.
    pub fn standard(seed: Option<u64>) -> Self {
        let mut rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        let catalog = Catalog::seeded(&mut rng);
        Self {
            catalog,
            rng,
            equity_ticks: 0,
            fund_ticks: 0,
        }
    }

    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    /// One tick for every instrument of `kind`.
    pub fn step_kind(&mut self, kind: InstrumentKind) {
        let tick = match kind {
            InstrumentKind::Equity => {
                self.equity_ticks += 1;
                self.equity_ticks
            }
            InstrumentKind::Fund => {
                self.fund_ticks += 1;
                self.fund_ticks
            }
        };
        let Self { catalog, rng, .. } = self;
        for inst in catalog.iter_mut().filter(|i| i.kind == kind) {
            for tf in Timeframe::ALL {
                if tf != Timeframe::PRIMARY && tick % tf.cadence() != 0 {
                    continue;
                }
                let Some(last) = inst.latest(tf) else {
                    continue;
                };
                let next = walk_step(last, perturbation(rng, tf.tick_volatility()));
                inst.record(tf, next);
            }
        }
    }
}

impl PriceSource for SimulatedFeed {
    fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    fn advance(&mut self, _now: DateTime<Utc>) {
        self.step_kind(InstrumentKind::Equity);
        self.step_kind(InstrumentKind::Fund);
    }

    fn name(&self) -> &'static str {
        "simulated"
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-interval driver: each tick advances prices, recomputes the
//! valuation and flushes any pending ledger write.

use crate::clock::Clock;
use crate::ledger::Ledger;
use crate::pricing::PriceSource;
use crate::valuation::{PortfolioSummary, portfolio_summary};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub seq: u64,
    pub at: DateTime<Utc>,
    pub summary: PortfolioSummary,
    pub net_worth: Decimal,
    /// A pending ledger write was flushed during this tick.
    pub flushed: bool,
}

pub struct Scheduler {
    clock: Arc<dyn Clock>,
    interval: Duration,
    next_due: DateTime<Utc>,
    stopped: Arc<AtomicBool>,
    seq: u64,
    /// Live-quote preference seen on the previous tick.
    live_pref: Option<bool>,
}

impl Scheduler {
    pub fn new(clock: Arc<dyn Clock>, interval: Duration) -> Self {
        let next_due = clock.now();
        Self {
            clock,
            interval,
            next_due,
            stopped: Arc::new(AtomicBool::new(false)),
            seq: 0,
            live_pref: None,
        }
    }

    /// Shared flag; setting it stops [`Scheduler::run`] after the current tick.
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        self.stopped.clone()
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn ticks(&self) -> u64 {
        self.seq
    }

    pub fn tick(&mut self, ledger: &mut Ledger, feed: &mut dyn PriceSource) -> TickReport {
        let now = self.clock.now();
        let live = ledger.prefs().live_enabled;
        if self.live_pref.is_some_and(|seen| seen != live) {
            feed.set_live_enabled(live);
        }
        self.live_pref = Some(live);
        feed.advance(now);
        let summary = portfolio_summary(ledger.state(), &*feed);
        let flushed = ledger.persist_if_dirty();
        self.seq += 1;
        debug!(
            seq = self.seq,
            value = %summary.market_value,
            invested = %summary.invested_cost,
            "tick"
        );
        TickReport {
            seq: self.seq,
            at: now,
            summary,
            net_worth: ledger.balance() + summary.market_value,
            flushed,
        }
    }

    /// Runs one tick if one is due. Missed intervals are not replayed.
    pub fn poll(&mut self, ledger: &mut Ledger, feed: &mut dyn PriceSource) -> Option<TickReport> {
        if self.is_stopped() {
            return None;
        }
        let now = self.clock.now();
        if now < self.next_due {
            return None;
        }
        self.next_due = now + self.interval;
        Some(self.tick(ledger, feed))
    }

    /// Blocks, ticking on schedule until stopped or `max_ticks` have run.
    pub fn run<F>(
        &mut self,
        ledger: &mut Ledger,
        feed: &mut dyn PriceSource,
        max_ticks: Option<u64>,
        mut on_tick: F,
    ) where
        F: FnMut(&TickReport, &Ledger, &dyn PriceSource),
    {
        let mut ran = 0u64;
        while !self.is_stopped() && max_ticks.is_none_or(|m| ran < m) {
            if let Some(report) = self.poll(ledger, feed) {
                ran += 1;
                on_tick(&report, &*ledger, &*feed);
                continue;
            }
            let wait = (self.next_due - self.clock.now())
                .to_std()
                .unwrap_or_default()
                .min(std::time::Duration::from_millis(250));
            std::thread::sleep(wait);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, HISTORY_CAP, Instrument};
    use crate::clock::ManualClock;
    use crate::models::Timeframe;
    use crate::pricing::{LiveFeed, QuoteClient, SimulatedFeed};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    fn setup() -> (Arc<ManualClock>, Ledger, SimulatedFeed) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let ledger = Ledger::open(Box::new(MemoryStore::new()), clock.clone(), dec!(100000));
        let feed = SimulatedFeed::new(
            Catalog::new(vec![Instrument::equity("TCS", "TCS", dec!(1000))]),
            Some(11),
        );
        (clock, ledger, feed)
    }

    #[test]
    fn poll_respects_interval() {
        let (clock, mut ledger, mut feed) = setup();
        let mut s = Scheduler::new(clock.clone(), Duration::seconds(1));
        assert!(s.poll(&mut ledger, &mut feed).is_some());
        assert!(s.poll(&mut ledger, &mut feed).is_none());
        clock.advance(Duration::milliseconds(999));
        assert!(s.poll(&mut ledger, &mut feed).is_none());
        clock.advance(Duration::milliseconds(1));
        assert_eq!(s.poll(&mut ledger, &mut feed).map(|r| r.seq), Some(2));
    }

    #[test]
    fn stopped_scheduler_does_nothing() {
        let (clock, mut ledger, mut feed) = setup();
        let mut s = Scheduler::new(clock.clone(), Duration::seconds(1));
        s.stop_handle().store(true, Ordering::SeqCst);
        assert!(s.poll(&mut ledger, &mut feed).is_none());
        s.run(&mut ledger, &mut feed, None, |_, _, _| {});
        assert_eq!(s.ticks(), 0);
    }

    #[test]
    fn forty_one_ticks_keep_the_window_at_cap() {
        let (clock, mut ledger, mut feed) = setup();
        let mut s = Scheduler::new(clock.clone(), Duration::seconds(1));
        let mut at_forty = Vec::new();
        for n in 1..=41 {
            s.poll(&mut ledger, &mut feed).unwrap();
            clock.advance(Duration::seconds(1));
            if n == 40 {
                at_forty = feed.history("TCS", Timeframe::Day).unwrap().to_vec();
            }
        }
        let series = feed.history("TCS", Timeframe::Day).unwrap();
        assert_eq!(series.len(), HISTORY_CAP);
        assert_eq!(series[0], at_forty[1]);
    }

    #[test]
    fn tick_values_the_portfolio() {
        let (clock, mut ledger, mut feed) = setup();
        ledger.buy_equity(&feed, "TCS", 10).unwrap();
        let mut s = Scheduler::new(clock, Duration::seconds(1));
        let report = s.tick(&mut ledger, &mut feed);
        let price = feed.current_price("TCS", Timeframe::Day).unwrap();
        assert_eq!(report.summary.invested_cost, dec!(10000));
        assert_eq!(report.summary.market_value, price * dec!(10));
        assert_eq!(report.net_worth, dec!(90000) + price * dec!(10));
        assert!(!report.flushed);
    }

    struct NoQuotes;

    impl QuoteClient for NoQuotes {
        fn fetch_quote(&self, _symbol: &str) -> anyhow::Result<Option<Decimal>> {
            Ok(None)
        }
    }

    #[test]
    fn live_preference_changes_reach_a_running_feed() {
        let (clock, mut ledger, sim) = setup();
        let mut feed = LiveFeed::new(
            sim,
            Arc::new(NoQuotes),
            Duration::seconds(5),
            Duration::seconds(4),
        )
        .unwrap();
        let mut s = Scheduler::new(clock, Duration::seconds(1));
        // The stored preference only takes over once it changes.
        s.tick(&mut ledger, &mut feed);
        assert!(feed.is_enabled());
        ledger.set_live_enabled(true);
        s.tick(&mut ledger, &mut feed);
        assert!(feed.is_enabled());
        ledger.set_live_enabled(false);
        s.tick(&mut ledger, &mut feed);
        assert!(!feed.is_enabled());
        ledger.set_live_enabled(true);
        s.tick(&mut ledger, &mut feed);
        assert!(feed.is_enabled());
    }

    #[test]
    fn run_stops_after_max_ticks() {
        let (clock, mut ledger, mut feed) = setup();
        let mut s = Scheduler::new(clock, Duration::seconds(1));
        let mut seen = 0;
        // The manual clock never moves, so only the first tick is ever due.
        s.run(&mut ledger, &mut feed, Some(1), |r, _, _| seen = r.seq);
        assert_eq!(seen, 1);
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{PriceSource, SimulatedFeed};
use crate::catalog::{Catalog, quote_symbol};
use crate::models::{InstrumentKind, Timeframe};
use crate::utils::http_client;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::thread;
use tracing::{debug, info};

pub trait QuoteClient: Send + Sync {
    /// Current price for `symbol`. `Ok(None)` means the provider answered
    /// without a usable price.
    fn fetch_quote(&self, symbol: &str) -> Result<Option<Decimal>>;
}

#[derive(Debug, Deserialize)]
struct FinnhubQuote {
    c: Option<serde_json::Number>,
}

pub struct FinnhubClient {
    http: reqwest::blocking::Client,
    endpoint: String,
    token: String,
}

impl FinnhubClient {
    pub fn new(endpoint: &str, token: &str) -> Result<Self> {
        Ok(Self {
            http: http_client()?,
            endpoint: endpoint.to_string(),
            token: token.trim().to_string(),
        })
    }
}

impl QuoteClient for FinnhubClient {
    fn fetch_quote(&self, symbol: &str) -> Result<Option<Decimal>> {
        let resp = self
            .http
            .get(&self.endpoint)
            .query(&[("symbol", symbol), ("token", self.token.as_str())])
            .send()?
            .error_for_status()?;
        let q: FinnhubQuote = resp
            .json()
            .with_context(|| format!("Unexpected quote payload for {}", symbol))?;
        Ok(q.c
            .and_then(|n| n.to_string().parse::<Decimal>().ok())
            .filter(|p| *p > Decimal::ZERO))
    }
}

struct QuoteResult {
    id: String,
    price: Option<Decimal>,
}

/// Background thread that performs blocking fetches; results come back over a channel.
struct QuoteWorker {
    requests: Sender<(String, String)>,
    results: Receiver<QuoteResult>,
}

impl QuoteWorker {
    fn spawn(client: Arc<dyn QuoteClient>) -> Result<Self> {
        let (req_tx, req_rx) = mpsc::channel::<(String, String)>();
        let (res_tx, res_rx) = mpsc::channel();
        thread::Builder::new()
            .name("sipfolio-quotes".into())
            .spawn(move || {
                for (id, symbol) in req_rx {
                    let price = match client.fetch_quote(&symbol) {
                        Ok(p) => p,
                        Err(e) => {
                            debug!(%symbol, error = %e, "quote fetch failed");
                            None
                        }
                    };
                    if res_tx.send(QuoteResult { id, price }).is_err() {
                        break;
                    }
                }
            })
            .context("Failed to start quote worker")?;
        Ok(Self {
            requests: req_tx,
            results: res_rx,
        })
    }
}

/// Simulated prices plus periodic real quotes for one equity at a time.
///
/// While enabled, equities random-walk only every `demo_every` and one
/// equity per `fetch_every` is quoted round-robin. A failed or empty quote
/// leaves state untouched.
pub struct LiveFeed {
    sim: SimulatedFeed,
    worker: QuoteWorker,
    enabled: bool,
    fetch_every: Duration,
    demo_every: Duration,
    last_fetch: Option<DateTime<Utc>>,
    last_demo: Option<DateTime<Utc>>,
    in_flight: bool,
    cursor: usize,
}

impl LiveFeed {
    pub fn new(
        sim: SimulatedFeed,
        client: Arc<dyn QuoteClient>,
        fetch_every: Duration,
        demo_every: Duration,
    ) -> Result<Self> {
        Ok(Self {
            sim,
            worker: QuoteWorker::spawn(client)?,
            enabled: true,
            fetch_every,
            demo_every,
            last_fetch: None,
            last_demo: None,
            in_flight: false,
            cursor: 0,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn in_flight(&self) -> bool {
        self.in_flight
    }

    /// Blocks up to `timeout` for an outstanding quote and applies it.
    pub fn settle(&mut self, timeout: std::time::Duration) {
        if !self.in_flight {
            return;
        }
        match self.worker.results.recv_timeout(timeout) {
            Ok(res) => self.apply(res),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => self.in_flight = false,
        }
    }

    fn drain_ready(&mut self) {
        loop {
            match self.worker.results.try_recv() {
                Ok(res) => self.apply(res),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.in_flight = false;
                    break;
                }
            }
        }
    }

    fn apply(&mut self, res: QuoteResult) {
        self.in_flight = false;
        let Some(price) = res.price else {
            return;
        };
        if !self.enabled {
            return;
        }
        if let Some(inst) = self.sim.catalog_mut().get_mut(&res.id) {
            inst.record(Timeframe::PRIMARY, price);
            info!(id = %res.id, %price, "live quote applied");
        }
    }

    fn due(last: Option<DateTime<Utc>>, every: Duration, now: DateTime<Utc>) -> bool {
        last.is_none_or(|t| now - t >= every)
    }

    fn dispatch(&mut self, now: DateTime<Utc>) {
        if self.in_flight || !Self::due(self.last_fetch, self.fetch_every, now) {
            return;
        }
        let count = self.sim.catalog().equities().count();
        let Some(inst) = self.sim.catalog().equities().nth(self.cursor % count.max(1)) else {
            return;
        };
        let id = inst.id.clone();
        let symbol = quote_symbol(&id).to_string();
        self.last_fetch = Some(now);
        self.cursor = self.cursor.wrapping_add(1);
        if self.worker.requests.send((id, symbol)).is_ok() {
            self.in_flight = true;
        }
    }
}

impl PriceSource for LiveFeed {
    fn catalog(&self) -> &Catalog {
        self.sim.catalog()
    }

    fn advance(&mut self, now: DateTime<Utc>) {
        self.drain_ready();
        if !self.enabled {
            self.sim.advance(now);
            return;
        }
        if Self::due(self.last_demo, self.demo_every, now) {
            self.sim.step_kind(InstrumentKind::Equity);
            self.last_demo = Some(now);
        }
        self.sim.step_kind(InstrumentKind::Fund);
        self.dispatch(now);
    }

    fn name(&self) -> &'static str {
        "live"
    }

    fn set_live_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            info!(enabled, "live quotes toggled");
        }
        self.enabled = enabled;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Instrument;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    struct FixedQuotes {
        price: Option<Decimal>,
        seen: Mutex<Vec<String>>,
    }

    impl QuoteClient for FixedQuotes {
        fn fetch_quote(&self, symbol: &str) -> Result<Option<Decimal>> {
            self.seen.lock().unwrap().push(symbol.to_string());
            Ok(self.price)
        }
    }

    struct Unreachable;

    impl QuoteClient for Unreachable {
        fn fetch_quote(&self, _symbol: &str) -> Result<Option<Decimal>> {
            anyhow::bail!("connection refused")
        }
    }

    fn sim() -> SimulatedFeed {
        SimulatedFeed::new(
            Catalog::new(vec![
                Instrument::equity("RELI", "Reliance", dec!(2520)),
                Instrument::equity("ZOMATO", "Zomato", dec!(160)),
                Instrument::fund("FND", "Fund", dec!(50), dec!(10)),
            ]),
            Some(3),
        )
    }

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn quote_is_appended_to_primary_series() {
        let client = Arc::new(FixedQuotes {
            price: Some(dec!(2600)),
            seen: Mutex::new(Vec::new()),
        });
        let mut feed =
            LiveFeed::new(sim(), client.clone(), Duration::seconds(5), Duration::seconds(4))
                .unwrap();
        feed.advance(t0());
        assert!(feed.in_flight());
        feed.settle(std::time::Duration::from_secs(5));
        assert_eq!(feed.current_price("RELI", Timeframe::Day), Some(dec!(2600)));
        assert_eq!(client.seen.lock().unwrap().as_slice(), ["RELIANCE.NS"]);
    }

    #[test]
    fn fetches_are_rate_limited_and_round_robin() {
        let client = Arc::new(FixedQuotes {
            price: Some(dec!(170)),
            seen: Mutex::new(Vec::new()),
        });
        let mut feed =
            LiveFeed::new(sim(), client.clone(), Duration::seconds(5), Duration::seconds(4))
                .unwrap();
        feed.advance(t0());
        feed.settle(std::time::Duration::from_secs(5));
        feed.advance(t0() + Duration::seconds(1));
        assert!(!feed.in_flight());
        feed.advance(t0() + Duration::seconds(5));
        feed.settle(std::time::Duration::from_secs(5));
        assert_eq!(
            client.seen.lock().unwrap().as_slice(),
            ["RELIANCE.NS", "ZOMATO"]
        );
        assert_eq!(feed.current_price("ZOMATO", Timeframe::Day), Some(dec!(170)));
    }

    #[test]
    fn failed_fetch_leaves_prices_alone() {
        let mut feed = LiveFeed::new(
            sim(),
            Arc::new(Unreachable),
            Duration::seconds(5),
            Duration::hours(1),
        )
        .unwrap();
        feed.advance(t0());
        let before = feed.history("RELI", Timeframe::Day).unwrap().to_vec();
        feed.settle(std::time::Duration::from_secs(5));
        assert!(!feed.in_flight());
        assert_eq!(feed.history("RELI", Timeframe::Day).unwrap(), before.as_slice());
    }

    #[test]
    fn disabled_feed_behaves_like_simulator() {
        let client = Arc::new(FixedQuotes {
            price: Some(dec!(1)),
            seen: Mutex::new(Vec::new()),
        });
        let mut feed =
            LiveFeed::new(sim(), client.clone(), Duration::seconds(5), Duration::seconds(4))
                .unwrap();
        feed.set_live_enabled(false);
        feed.advance(t0());
        assert!(!feed.in_flight());
        assert!(client.seen.lock().unwrap().is_empty());
        assert_eq!(feed.history("RELI", Timeframe::Day).unwrap().len(), 2);
    }
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, anyhow};
use chrono::DateTime;
use rust_decimal_macros::dec;
use sipfolio::catalog::{Catalog, Instrument};
use sipfolio::clock::{Clock, ManualClock};
use sipfolio::ledger::Ledger;
use sipfolio::models::{SipFrequency, Timeframe};
use sipfolio::pricing::SimulatedFeed;
use sipfolio::store::{LEDGER_KEY, MemoryStore, SqliteStore, Store};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tempfile::tempdir;

fn clock() -> Arc<dyn Clock> {
    Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ))
}

fn feed() -> SimulatedFeed {
    SimulatedFeed::new(
        Catalog::new(vec![
            Instrument::equity("INFY", "Infosys", dec!(1500)),
            Instrument::fund("PARAG-FLEXI", "Parag Parikh Flexi Cap", dec!(80), dec!(21.1)),
        ]),
        Some(9),
    )
}

#[test]
fn ledger_survives_reopen_from_sqlite() {
    let dir = tempdir().unwrap();
    let f = feed();
    let saved = {
        let store = SqliteStore::open_or_init(Some(dir.path())).unwrap();
        let mut l = Ledger::open(Box::new(store), clock(), dec!(100000));
        l.buy_equity(&f, "INFY", 4).unwrap();
        l.start_sip(&f, "PARAG-FLEXI", dec!(1000), SipFrequency::Quarterly, dec!(0), true)
            .unwrap();
        l.toggle_watch(&f, "INFY").unwrap();
        l.set_timeframe(Timeframe::Year);
        assert!(!l.is_dirty());
        l.state().clone()
    };

    let store = SqliteStore::open_or_init(Some(dir.path())).unwrap();
    let reopened = Ledger::open(Box::new(store), clock(), dec!(100000));
    assert_eq!(reopened.state(), &saved);
    assert_eq!(reopened.balance(), dec!(93000));
    assert_eq!(reopened.watchlist(), ["INFY".to_string()]);
    assert_eq!(reopened.timeframe(), Timeframe::Year);
}

#[test]
fn corrupt_blob_falls_back_to_defaults() {
    let store = MemoryStore::with_blob(LEDGER_KEY, "{ not json");
    let l = Ledger::open(Box::new(store), clock(), dec!(50000));
    assert_eq!(l.balance(), dec!(50000));
    assert!(l.transactions().is_empty());
}

#[test]
fn partial_blob_fills_missing_fields() {
    let store = MemoryStore::with_blob(LEDGER_KEY, r#"{"balance":"1234.50"}"#);
    let l = Ledger::open(Box::new(store), clock(), dec!(100000));
    assert_eq!(l.balance(), dec!(1234.50));
    assert!(l.sips().is_empty());
    assert_eq!(l.timeframe(), Timeframe::Day);
}

/// Store whose writes fail while `down` is set.
struct FlakyStore {
    inner: MemoryStore,
    down: Arc<AtomicBool>,
}

impl Store for FlakyStore {
    fn load(&self, key: &str) -> Result<Option<String>> {
        self.inner.load(key)
    }

    fn save(&mut self, key: &str, blob: &str) -> Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(anyhow!("disk unavailable"));
        }
        self.inner.save(key, blob)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.inner.remove(key)
    }
}

#[test]
fn failed_write_keeps_operating_and_retries() {
    let down = Arc::new(AtomicBool::new(true));
    let store = FlakyStore {
        inner: MemoryStore::new(),
        down: down.clone(),
    };
    let f = feed();
    let mut l = Ledger::open(Box::new(store), clock(), dec!(100000));
    assert!(l.is_dirty());

    l.buy_equity(&f, "INFY", 1).unwrap();
    assert_eq!(l.balance(), dec!(98500));
    assert!(l.is_dirty());
    assert!(!l.persist_if_dirty());

    down.store(false, Ordering::SeqCst);
    assert!(l.persist_if_dirty());
    assert!(!l.is_dirty());
}

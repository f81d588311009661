// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::DateTime;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sipfolio::catalog::{Catalog, Instrument};
use sipfolio::clock::ManualClock;
use sipfolio::error::LedgerError;
use sipfolio::ledger::Ledger;
use sipfolio::models::{RedeemMode, SipFrequency, Timeframe};
use sipfolio::pricing::SimulatedFeed;
use sipfolio::store::MemoryStore;
use sipfolio::valuation::{holdings, portfolio_summary};
use std::sync::Arc;

fn ledger() -> Ledger {
    let clock = Arc::new(ManualClock::new(
        DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
    ));
    Ledger::open(Box::new(MemoryStore::new()), clock, dec!(100000))
}

fn feed(price: Decimal, nav: Decimal) -> SimulatedFeed {
    SimulatedFeed::new(
        Catalog::new(vec![
            Instrument::equity("TCS", "Tata Consultancy", price),
            Instrument::fund("AXIS-SML", "Axis Small Cap", nav, dec!(28.6)),
        ]),
        Some(3),
    )
}

fn set_price(feed: &mut SimulatedFeed, id: &str, price: Decimal) {
    feed.catalog_mut()
        .get_mut(id)
        .unwrap()
        .record(Timeframe::Day, price);
}

#[test]
fn buy_buy_sell_walkthrough() {
    let mut l = ledger();
    let mut f = feed(dec!(1000), dec!(100));

    let exec = l.buy_equity(&f, "TCS", 5).unwrap();
    assert_eq!(exec.balance, dec!(95000));
    let pos = exec.position.unwrap();
    assert_eq!((pos.quantity, pos.avg_cost), (5, dec!(1000)));

    set_price(&mut f, "TCS", dec!(1200));
    let exec = l.buy_equity(&f, "TCS", 5).unwrap();
    let pos = exec.position.unwrap();
    assert_eq!((pos.quantity, pos.avg_cost), (10, dec!(1100)));
    assert_eq!(exec.balance, dec!(89000));

    set_price(&mut f, "TCS", dec!(1300));
    let exec = l.sell_equity(&f, "TCS", 8).unwrap();
    let pos = exec.position.unwrap();
    assert_eq!((pos.quantity, pos.avg_cost), (2, dec!(1100)));
    assert_eq!(exec.balance, dec!(99400));
    assert_eq!(exec.transaction.amount, dec!(10400));

    let types: Vec<_> = l.transactions().iter().map(|t| t.type_label()).collect();
    assert_eq!(types, ["buy", "buy", "sell"]);
}

#[test]
fn invest_then_redeem_by_amount() {
    let mut l = ledger();
    let mut f = feed(dec!(1000), dec!(100));

    let exec = l.invest_fund(&f, "AXIS-SML", dec!(1000)).unwrap();
    let pos = exec.position.unwrap();
    assert_eq!(pos.units, dec!(10.000));
    assert_eq!(pos.avg_cost, dec!(100));

    set_price(&mut f, "AXIS-SML", dec!(125));
    let exec = l
        .redeem_fund(&f, "AXIS-SML", dec!(500), RedeemMode::ByAmount)
        .unwrap();
    let pos = exec.position.unwrap();
    assert_eq!(pos.units, dec!(6.000));
    assert_eq!(pos.avg_cost, dec!(100));
    assert_eq!(exec.transaction.amount, dec!(500));
    assert_eq!(l.balance(), dec!(99500));
}

#[test]
fn redeem_leaving_dust_closes_the_position() {
    let mut l = ledger();
    let f = feed(dec!(1000), dec!(100));
    l.invest_fund(&f, "AXIS-SML", dec!(1000)).unwrap();
    let exec = l
        .redeem_fund(&f, "AXIS-SML", dec!(9.995), RedeemMode::ByUnits)
        .unwrap();
    assert!(exec.position.is_none());
    assert!(l.fund_holding("AXIS-SML").is_none());
    assert!(holdings(l.state(), &f).is_empty());
    assert_eq!(portfolio_summary(l.state(), &f).invested_cost, Decimal::ZERO);
}

#[test]
fn overselling_and_overredeeming_change_nothing() {
    let mut l = ledger();
    let f = feed(dec!(1000), dec!(100));
    l.buy_equity(&f, "TCS", 3).unwrap();
    l.invest_fund(&f, "AXIS-SML", dec!(1000)).unwrap();
    let before = l.state().clone();

    assert!(matches!(
        l.sell_equity(&f, "TCS", 4),
        Err(LedgerError::ExceedsHolding { .. })
    ));
    assert!(matches!(
        l.redeem_fund(&f, "AXIS-SML", dec!(10.5), RedeemMode::ByUnits),
        Err(LedgerError::ExceedsHolding { .. })
    ));
    assert!(l
        .redeem_fund(&f, "AXIS-SML", dec!(1001), RedeemMode::ByAmount)
        .is_err());
    assert!(matches!(
        l.buy_equity(&f, "TCS", 1000),
        Err(LedgerError::InsufficientFunds { .. })
    ));
    assert_eq!(l.state(), &before);
}

#[test]
fn sip_with_immediate_investment_moves_cash_once() {
    let mut l = ledger();
    let f = feed(dec!(1000), dec!(100));
    let started = l
        .start_sip(&f, "AXIS-SML", dec!(2000), SipFrequency::Monthly, dec!(10), true)
        .unwrap();
    assert!(started.investment.is_some());
    assert_eq!(l.balance(), dec!(98000));
    assert_eq!(l.sips().len(), 1);

    let deposited = dec!(25000);
    l.add_cash(deposited).unwrap();
    let net: Decimal = l.transactions().iter().map(|t| t.cash_effect()).sum();
    assert_eq!(dec!(100000) + deposited + net, l.balance());

    assert!(l.stop_sip(&started.sip.id));
    assert!(!l.stop_sip(&started.sip.id));
    assert!(l.sips().is_empty());
}

#[test]
fn reset_is_idempotent() {
    let mut l = ledger();
    let f = feed(dec!(1000), dec!(100));
    l.buy_equity(&f, "TCS", 2).unwrap();
    l.toggle_watch(&f, "TCS").unwrap();
    l.set_timeframe(Timeframe::Month);
    l.reset();
    let once = l.state().clone();
    l.reset();
    assert_eq!(l.state(), &once);
    assert_eq!(once.balance, dec!(100000));
    assert!(once.holdings.is_empty() && once.transactions.is_empty() && once.watchlist.is_empty());
    assert_eq!(once.prefs.timeframe, Timeframe::Day);
}

#[derive(Debug, Clone)]
enum Op {
    Buy(u64, u32),
    Sell(u64, u32),
    Deposit(u32),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..20, 1u32..5000).prop_map(|(q, p)| Op::Buy(q, p)),
        (1u64..20, 1u32..5000).prop_map(|(q, p)| Op::Sell(q, p)),
        (0u32..50_000).prop_map(Op::Deposit),
    ]
}

proptest! {
    #[test]
    fn average_cost_is_the_mean_of_buys(ops in prop::collection::vec(op(), 1..40)) {
        let mut l = ledger();
        let mut f = feed(dec!(1), dec!(100));
        let (mut cost, mut qty) = (Decimal::ZERO, Decimal::ZERO);
        for op in ops {
            let (q, p) = match op {
                Op::Buy(q, p) | Op::Sell(q, p) => (q, p),
                Op::Deposit(amount) => {
                    let _ = l.add_cash(Decimal::from(amount));
                    continue;
                }
            };
            set_price(&mut f, "TCS", Decimal::from(p));
            match op {
                Op::Buy(..) => {
                    if l.buy_equity(&f, "TCS", q).is_ok() {
                        cost += Decimal::from(p) * Decimal::from(q);
                        qty += Decimal::from(q);
                    }
                }
                Op::Sell(..) => {
                    let closed = l
                        .sell_equity(&f, "TCS", q)
                        .is_ok_and(|exec| exec.position.is_none());
                    if closed {
                        cost = Decimal::ZERO;
                        qty = Decimal::ZERO;
                    }
                }
                Op::Deposit(_) => {}
            }
            match l.holding("TCS") {
                Some(pos) => {
                    let expected = cost / qty;
                    prop_assert!((pos.avg_cost - expected).abs() < dec!(0.000001));
                }
                None => prop_assert!(qty.is_zero()),
            }
        }
    }

    #[test]
    fn refused_operations_leave_state_untouched(
        ops in prop::collection::vec(op(), 1..30),
        redeem in 1u32..3000,
    ) {
        let mut l = ledger();
        let mut f = feed(dec!(1), dec!(100));
        l.invest_fund(&f, "AXIS-SML", dec!(1000)).unwrap();
        for op in ops {
            let before = l.state().clone();
            let book_before = before.book_value();
            let result = match op {
                Op::Buy(q, p) => {
                    set_price(&mut f, "TCS", Decimal::from(p) * dec!(10));
                    l.buy_equity(&f, "TCS", q).map(|_| ())
                }
                Op::Sell(q, p) => {
                    set_price(&mut f, "TCS", Decimal::from(p) * dec!(10));
                    l.sell_equity(&f, "TCS", q).map(|_| ())
                }
                Op::Deposit(amount) => l.add_cash(Decimal::from(amount)).map(|_| ()),
            };
            match (result, op) {
                (Err(_), _) => prop_assert_eq!(l.state(), &before),
                (Ok(()), Op::Buy(..)) => {
                    prop_assert!((l.state().book_value() - book_before).abs() < dec!(0.000001));
                }
                (Ok(()), Op::Sell(..)) => prop_assert!(l.balance() > before.balance),
                (Ok(()), Op::Deposit(amount)) => {
                    prop_assert_eq!(l.state().book_value(), book_before + Decimal::from(amount));
                }
            }
            prop_assert!(l.balance() >= Decimal::ZERO);
        }
        let before = l.state().clone();
        let r = l.redeem_fund(&f, "AXIS-SML", Decimal::from(redeem), RedeemMode::ByAmount);
        if r.is_err() {
            prop_assert_eq!(l.state(), &before);
        } else {
            prop_assert!(redeem <= 1000);
        }
    }
}

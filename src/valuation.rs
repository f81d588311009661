// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Read-only valuation over ledger state and current quotes.

use crate::ledger::{FUND_DUST_UNITS, LedgerState};
use crate::models::{AssetKind, Timeframe};
use crate::pricing::PriceSource;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct PortfolioSummary {
    pub invested_cost: Decimal,
    pub market_value: Decimal,
}

impl PortfolioSummary {
    pub fn profit_loss(&self) -> Decimal {
        self.market_value - self.invested_cost
    }
}

/// Equities are valued at the state's active timeframe, funds at the
/// primary NAV. Positions whose instrument has no quote add to cost only.
pub fn portfolio_summary(state: &LedgerState, prices: &dyn PriceSource) -> PortfolioSummary {
    let tf = state.prefs.timeframe;
    let mut summary = PortfolioSummary::default();
    for (id, pos) in &state.holdings {
        summary.invested_cost += pos.invested();
        if let Some(price) = prices.current_price(id, tf) {
            summary.market_value += pos.market_value(price);
        }
    }
    for (id, pos) in &state.fund_holdings {
        if pos.units < FUND_DUST_UNITS {
            continue;
        }
        summary.invested_cost += pos.invested();
        if let Some(nav) = prices.current_price(id, Timeframe::PRIMARY) {
            summary.market_value += pos.market_value(nav);
        }
    }
    summary
}

pub fn net_worth(state: &LedgerState, prices: &dyn PriceSource) -> Decimal {
    state.balance + portfolio_summary(state, prices).market_value
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingRow {
    pub kind: AssetKind,
    pub id: String,
    pub name: String,
    /// Shares for equities, units for funds.
    pub quantity: Decimal,
    pub avg_cost: Decimal,
    pub price: Decimal,
    pub invested: Decimal,
    pub value: Decimal,
}

impl HoldingRow {
    pub fn profit_loss(&self) -> Decimal {
        self.value - self.invested
    }
}

/// Per-position rows for display; positions missing from the catalog are skipped.
pub fn holdings(state: &LedgerState, prices: &dyn PriceSource) -> Vec<HoldingRow> {
    let tf = state.prefs.timeframe;
    let mut rows = Vec::with_capacity(state.holdings.len() + state.fund_holdings.len());
    for (id, pos) in &state.holdings {
        let Some(inst) = prices.catalog().equity(id) else {
            continue;
        };
        let Some(price) = inst.latest(tf) else {
            continue;
        };
        rows.push(HoldingRow {
            kind: AssetKind::Stock,
            id: id.clone(),
            name: inst.name.clone(),
            quantity: Decimal::from(pos.quantity),
            avg_cost: pos.avg_cost,
            price,
            invested: pos.invested(),
            value: pos.market_value(price),
        });
    }
    for (id, pos) in &state.fund_holdings {
        if pos.units < FUND_DUST_UNITS {
            continue;
        }
        let Some(inst) = prices.catalog().fund(id) else {
            continue;
        };
        let Some(nav) = inst.price() else {
            continue;
        };
        rows.push(HoldingRow {
            kind: AssetKind::Fund,
            id: id.clone(),
            name: inst.name.clone(),
            quantity: pos.units,
            avg_cost: pos.avg_cost,
            price: nav,
            invested: pos.invested(),
            value: pos.market_value(nav),
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, Instrument};
    use crate::models::{EquityPosition, FundPosition};
    use crate::pricing::SimulatedFeed;
    use rust_decimal_macros::dec;

    fn feed() -> SimulatedFeed {
        SimulatedFeed::new(
            Catalog::new(vec![
                Instrument::equity("TCS", "TCS", dec!(1300))
                    .with_history(Timeframe::Week, vec![dec!(1250)]),
                Instrument::fund("AXIS-SML", "Axis Small Cap", dec!(125), dec!(28.6)),
            ]),
            Some(5),
        )
    }

    fn state() -> LedgerState {
        let mut s = LedgerState::with_balance(dec!(89000));
        s.holdings.insert(
            "TCS".into(),
            EquityPosition {
                quantity: 10,
                avg_cost: dec!(1100),
            },
        );
        s.fund_holdings.insert(
            "AXIS-SML".into(),
            FundPosition {
                units: dec!(6.000),
                avg_cost: dec!(100),
            },
        );
        s.fund_holdings.insert(
            "QUANT-SML".into(),
            FundPosition {
                units: dec!(0.005),
                avg_cost: dec!(100),
            },
        );
        s
    }

    #[test]
    fn summary_values_positions_and_skips_dust() {
        let s = state();
        let f = feed();
        let sum = portfolio_summary(&s, &f);
        assert_eq!(sum.invested_cost, dec!(11600));
        assert_eq!(sum.market_value, dec!(13750));
        assert_eq!(sum.profit_loss(), dec!(2150));
        assert_eq!(net_worth(&s, &f), dec!(102750));
    }

    #[test]
    fn summary_is_idempotent() {
        let s = state();
        let f = feed();
        assert_eq!(portfolio_summary(&s, &f), portfolio_summary(&s, &f));
    }

    #[test]
    fn equities_follow_active_timeframe() {
        let mut s = state();
        s.prefs.timeframe = Timeframe::Week;
        let sum = portfolio_summary(&s, &feed());
        assert_eq!(sum.market_value, dec!(12500) + dec!(750));
    }

    #[test]
    fn holding_rows_cover_open_positions() {
        let rows = holdings(&state(), &feed());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "TCS");
        assert_eq!(rows[0].profit_loss(), dec!(2000));
        assert_eq!(rows[1].kind, AssetKind::Fund);
        assert_eq!(rows[1].value, dec!(750));
    }
}

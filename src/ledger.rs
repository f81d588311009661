// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The ledger owns cash, positions, SIPs and the transaction log, and is the
//! only place portfolio state is mutated.
//!
//! Every operation validates first and then applies the position update,
//! the balance update and the log append together, so a refused operation
//! leaves no trace. Successful operations are persisted immediately; a failed
//! save keeps the ledger dirty until [`Ledger::persist_if_dirty`] succeeds.

use crate::clock::Clock;
use crate::config::DEFAULT_BALANCE;
use crate::error::LedgerError;
use crate::models::{
    EquityFill, EquityPosition, FundFill, FundPosition, RedeemMode, Sip, SipFrequency,
    Timeframe, Transaction, TxEntry,
};
use crate::pricing::PriceSource;
use crate::store::{LEDGER_KEY, Store};
use crate::utils::round3;
use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Fund holdings below this many units are treated as closed.
pub const FUND_DUST_UNITS: Decimal = dec!(0.01);

const UNIT_TOLERANCE: Decimal = dec!(0.000000001);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Preferences {
    /// Timeframe used to price equities.
    pub timeframe: Timeframe,
    pub live_enabled: bool,
    pub quote_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerState {
    pub balance: Decimal,
    pub holdings: BTreeMap<String, EquityPosition>,
    pub fund_holdings: BTreeMap<String, FundPosition>,
    pub sips: Vec<Sip>,
    pub transactions: Vec<Transaction>,
    pub watchlist: Vec<String>,
    pub prefs: Preferences,
}

impl Default for LedgerState {
    fn default() -> Self {
        Self::with_balance(DEFAULT_BALANCE)
    }
}

impl LedgerState {
    pub fn with_balance(balance: Decimal) -> Self {
        Self {
            balance,
            holdings: BTreeMap::new(),
            fund_holdings: BTreeMap::new(),
            sips: Vec::new(),
            transactions: Vec::new(),
            watchlist: Vec::new(),
            prefs: Preferences::default(),
        }
    }

    /// Balance plus the cost basis of every open position.
    pub fn book_value(&self) -> Decimal {
        self.balance
            + self.holdings.values().map(EquityPosition::invested).sum::<Decimal>()
            + self
                .fund_holdings
                .values()
                .filter(|p| p.units >= FUND_DUST_UNITS)
                .map(FundPosition::invested)
                .sum::<Decimal>()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquityExecution {
    /// `None` once the position is closed.
    pub position: Option<EquityPosition>,
    pub balance: Decimal,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FundExecution {
    /// `None` once the position is closed.
    pub position: Option<FundPosition>,
    pub balance: Decimal,
    pub transaction: Transaction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SipStarted {
    pub sip: Sip,
    pub investment: Option<FundExecution>,
}

pub struct Ledger {
    state: LedgerState,
    default_balance: Decimal,
    clock: Arc<dyn Clock>,
    store: Box<dyn Store>,
    dirty: bool,
}

impl Ledger {
    /// Loads the ledger from `store`. Missing state starts from defaults and
    /// is written back; unreadable or corrupt state is discarded.
    pub fn open(store: Box<dyn Store>, clock: Arc<dyn Clock>, default_balance: Decimal) -> Self {
        let loaded = match store.load(LEDGER_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<LedgerState>(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    warn!(error = %e, "stored ledger state is corrupt; starting fresh");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "ledger state unavailable; starting fresh");
                None
            }
        };
        let fresh = loaded.is_none();
        let mut ledger = Self {
            state: loaded.unwrap_or_else(|| LedgerState::with_balance(default_balance)),
            default_balance,
            clock,
            store,
            dirty: false,
        };
        if fresh {
            ledger.persist();
        }
        ledger
    }

    pub fn state(&self) -> &LedgerState {
        &self.state
    }

    pub fn balance(&self) -> Decimal {
        self.state.balance
    }

    pub fn prefs(&self) -> &Preferences {
        &self.state.prefs
    }

    pub fn timeframe(&self) -> Timeframe {
        self.state.prefs.timeframe
    }

    pub fn holding(&self, id: &str) -> Option<&EquityPosition> {
        self.state.holdings.get(id)
    }

    /// Fund position, hiding sub-dust residue.
    pub fn fund_holding(&self, id: &str) -> Option<&FundPosition> {
        self.state
            .fund_holdings
            .get(id)
            .filter(|p| p.units >= FUND_DUST_UNITS)
    }

    pub fn sips(&self) -> &[Sip] {
        &self.state.sips
    }

    pub fn watchlist(&self) -> &[String] {
        &self.state.watchlist
    }

    /// Append order, which is also chronological.
    pub fn transactions(&self) -> &[Transaction] {
        &self.state.transactions
    }

    pub fn transactions_newest_first(&self) -> Vec<&Transaction> {
        let mut out: Vec<&Transaction> = self.state.transactions.iter().collect();
        out.sort_by(|a, b| b.ts.cmp(&a.ts));
        out
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn buy_equity(
        &mut self,
        prices: &dyn PriceSource,
        id: &str,
        quantity: u64,
    ) -> Result<EquityExecution, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "quantity must be a positive whole number".into(),
            ));
        }
        let inst = prices
            .catalog()
            .equity(id)
            .ok_or_else(|| LedgerError::UnknownInstrument(id.to_string()))?;
        let price = inst
            .latest(self.timeframe())
            .ok_or_else(|| LedgerError::UnknownInstrument(id.to_string()))?;
        let qty = Decimal::from(quantity);
        let cost = price * qty;
        if cost > self.state.balance {
            return Err(LedgerError::InsufficientFunds {
                required: cost,
                available: self.state.balance,
            });
        }

        let (old_qty, old_avg) = self
            .state
            .holdings
            .get(id)
            .map(|p| (p.quantity, p.avg_cost))
            .unwrap_or((0, Decimal::ZERO));
        let new_qty = old_qty + quantity;
        let new_avg = (Decimal::from(old_qty) * old_avg + cost) / Decimal::from(new_qty);
        let position = EquityPosition {
            quantity: new_qty,
            avg_cost: new_avg,
        };
        self.state.holdings.insert(id.to_string(), position.clone());
        self.state.balance -= cost;
        let transaction = self.log(
            -cost,
            TxEntry::Buy(EquityFill {
                instrument_id: id.to_string(),
                name: inst.name.clone(),
                quantity,
                price,
            }),
        );
        debug!(%id, quantity, %price, "buy executed");
        self.persist();
        Ok(EquityExecution {
            position: Some(position),
            balance: self.state.balance,
            transaction,
        })
    }

    pub fn sell_equity(
        &mut self,
        prices: &dyn PriceSource,
        id: &str,
        quantity: u64,
    ) -> Result<EquityExecution, LedgerError> {
        if quantity == 0 {
            return Err(LedgerError::InvalidInput(
                "quantity must be a positive whole number".into(),
            ));
        }
        let held = self
            .state
            .holdings
            .get(id)
            .filter(|p| p.quantity > 0)
            .ok_or_else(|| LedgerError::NoPosition(id.to_string()))?;
        if quantity > held.quantity {
            return Err(LedgerError::ExceedsHolding {
                id: id.to_string(),
                requested: Decimal::from(quantity),
                held: Decimal::from(held.quantity),
            });
        }
        let inst = prices
            .catalog()
            .equity(id)
            .ok_or_else(|| LedgerError::UnknownInstrument(id.to_string()))?;
        let price = inst
            .latest(self.timeframe())
            .ok_or_else(|| LedgerError::UnknownInstrument(id.to_string()))?;
        let proceeds = price * Decimal::from(quantity);

        let remaining = held.quantity - quantity;
        let position = if remaining == 0 {
            self.state.holdings.remove(id);
            None
        } else {
            let pos = self
                .state
                .holdings
                .get_mut(id)
                .ok_or_else(|| LedgerError::NoPosition(id.to_string()))?;
            pos.quantity = remaining;
            Some(pos.clone())
        };
        self.state.balance += proceeds;
        let transaction = self.log(
            proceeds,
            TxEntry::Sell(EquityFill {
                instrument_id: id.to_string(),
                name: inst.name.clone(),
                quantity,
                price,
            }),
        );
        debug!(%id, quantity, %price, "sell executed");
        self.persist();
        Ok(EquityExecution {
            position,
            balance: self.state.balance,
            transaction,
        })
    }

    pub fn invest_fund(
        &mut self,
        prices: &dyn PriceSource,
        fund_id: &str,
        amount: Decimal,
    ) -> Result<FundExecution, LedgerError> {
        let exec = self.apply_invest(prices, fund_id, amount)?;
        self.persist();
        Ok(exec)
    }

    fn apply_invest(
        &mut self,
        prices: &dyn PriceSource,
        fund_id: &str,
        amount: Decimal,
    ) -> Result<FundExecution, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput("amount must be positive".into()));
        }
        let (name, nav) = fund_nav(prices, fund_id)?;
        if amount > self.state.balance {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: self.state.balance,
            });
        }
        let units = amount / nav;
        let (old_units, old_avg) = self
            .state
            .fund_holdings
            .get(fund_id)
            .map(|p| (p.units, p.avg_cost))
            .unwrap_or((Decimal::ZERO, Decimal::ZERO));
        let new_units = round3(old_units + units);
        if new_units < FUND_DUST_UNITS {
            return Err(LedgerError::InvalidInput(format!(
                "amount buys fewer than {} units",
                FUND_DUST_UNITS
            )));
        }
        let new_avg = (old_units * old_avg + amount) / new_units;
        let position = FundPosition {
            units: new_units,
            avg_cost: new_avg,
        };
        self.state
            .fund_holdings
            .insert(fund_id.to_string(), position.clone());
        self.state.balance -= amount;
        let transaction = self.log(
            -amount,
            TxEntry::Invest(FundFill {
                fund_id: fund_id.to_string(),
                name,
                units,
                nav,
            }),
        );
        debug!(%fund_id, %amount, %nav, "investment executed");
        Ok(FundExecution {
            position: Some(position),
            balance: self.state.balance,
            transaction,
        })
    }

    /// Redeems by rupee amount (capped at the floored holding value) or by units.
    pub fn redeem_fund(
        &mut self,
        prices: &dyn PriceSource,
        fund_id: &str,
        value: Decimal,
        mode: RedeemMode,
    ) -> Result<FundExecution, LedgerError> {
        if value <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput(
                "redeem amount or units must be positive".into(),
            ));
        }
        let held = self
            .state
            .fund_holdings
            .get(fund_id)
            .cloned()
            .ok_or_else(|| LedgerError::NoPosition(fund_id.to_string()))?;
        if held.units < FUND_DUST_UNITS {
            return Err(LedgerError::DustPosition(fund_id.to_string()));
        }
        let (name, nav) = fund_nav(prices, fund_id)?;

        let (units, amount) = match mode {
            RedeemMode::ByAmount => {
                let max = (held.units * nav).floor();
                if value > max {
                    return Err(LedgerError::ExceedsHolding {
                        id: fund_id.to_string(),
                        requested: value,
                        held: max,
                    });
                }
                (held.units.min(round3(value / nav)), value)
            }
            RedeemMode::ByUnits => {
                let units = round3(value);
                if units > held.units + UNIT_TOLERANCE {
                    return Err(LedgerError::ExceedsHolding {
                        id: fund_id.to_string(),
                        requested: units,
                        held: held.units,
                    });
                }
                (units, units * nav)
            }
        };
        if units <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput(
                "redemption is smaller than one thousandth of a unit".into(),
            ));
        }

        let remaining = round3(held.units - units);
        let position = if remaining < FUND_DUST_UNITS {
            self.state.fund_holdings.remove(fund_id);
            None
        } else {
            let pos = FundPosition {
                units: remaining,
                avg_cost: held.avg_cost,
            };
            self.state
                .fund_holdings
                .insert(fund_id.to_string(), pos.clone());
            Some(pos)
        };
        self.state.balance += amount;
        let transaction = self.log(
            amount,
            TxEntry::Redeem(FundFill {
                fund_id: fund_id.to_string(),
                name,
                units,
                nav,
            }),
        );
        debug!(%fund_id, %units, %amount, "redemption executed");
        self.persist();
        Ok(FundExecution {
            position,
            balance: self.state.balance,
            transaction,
        })
    }

    /// Records a SIP, optionally investing the first instalment right away.
    /// Creating the plan itself moves no cash.
    pub fn start_sip(
        &mut self,
        prices: &dyn PriceSource,
        fund_id: &str,
        amount: Decimal,
        frequency: SipFrequency,
        step_up_pct: Decimal,
        invest_now: bool,
    ) -> Result<SipStarted, LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidInput("SIP amount must be positive".into()));
        }
        if step_up_pct < Decimal::ZERO {
            return Err(LedgerError::InvalidInput(
                "step-up percentage must not be negative".into(),
            ));
        }
        let name = prices
            .catalog()
            .fund(fund_id)
            .map(|f| f.name.clone())
            .ok_or_else(|| LedgerError::UnknownInstrument(fund_id.to_string()))?;

        let investment = if invest_now {
            Some(self.apply_invest(prices, fund_id, amount)?)
        } else {
            None
        };

        let now = self.clock.now();
        let sip = Sip {
            id: self.next_sip_id(now),
            fund_id: fund_id.to_string(),
            amount,
            started_at: now,
            frequency,
            step_up_pct,
        };
        self.state.sips.push(sip.clone());
        self.log(
            -amount,
            TxEntry::SipStart {
                fund_id: fund_id.to_string(),
                name,
                sip_id: sip.id.clone(),
            },
        );
        debug!(sip_id = %sip.id, %fund_id, %amount, "SIP started");
        self.persist();
        Ok(SipStarted { sip, investment })
    }

    /// Removes the SIP; returns whether one was removed.
    pub fn stop_sip(&mut self, sip_id: &str) -> bool {
        let before = self.state.sips.len();
        self.state.sips.retain(|s| s.id != sip_id);
        let removed = self.state.sips.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Adds or removes an equity from the watchlist; returns whether it is now watched.
    pub fn toggle_watch(
        &mut self,
        prices: &dyn PriceSource,
        id: &str,
    ) -> Result<bool, LedgerError> {
        if prices.catalog().equity(id).is_none() {
            return Err(LedgerError::UnknownInstrument(id.to_string()));
        }
        let watched = if let Some(pos) = self.state.watchlist.iter().position(|w| w == id) {
            self.state.watchlist.remove(pos);
            false
        } else {
            self.state.watchlist.push(id.to_string());
            true
        };
        self.persist();
        Ok(watched)
    }

    /// Deposits whole rupees into cash and returns the new balance.
    /// Deposits are not part of the transaction log.
    pub fn add_cash(&mut self, amount: Decimal) -> Result<Decimal, LedgerError> {
        if amount <= Decimal::ZERO || !amount.fract().is_zero() {
            return Err(LedgerError::InvalidInput(
                "deposit must be a positive whole amount".into(),
            ));
        }
        self.state.balance += amount;
        debug!(%amount, balance = %self.state.balance, "cash added");
        self.persist();
        Ok(self.state.balance)
    }

    pub fn set_timeframe(&mut self, tf: Timeframe) {
        self.state.prefs.timeframe = tf;
        self.persist();
    }

    pub fn set_live_enabled(&mut self, enabled: bool) {
        self.state.prefs.live_enabled = enabled;
        self.persist();
    }

    pub fn set_quote_api_key(&mut self, key: Option<String>) {
        self.state.prefs.quote_api_key = key
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        self.persist();
    }

    /// Back to the default balance with no positions, plans, history or preferences.
    pub fn reset(&mut self) {
        if let Err(e) = self.store.remove(LEDGER_KEY) {
            warn!(error = %e, "failed to clear stored ledger");
        }
        self.state = LedgerState::with_balance(self.default_balance);
        self.persist();
    }

    /// Writes the full state. A failed write is logged and retried later.
    pub fn persist(&mut self) {
        let result = serde_json::to_string(&self.state)
            .map_err(anyhow::Error::from)
            .and_then(|blob| self.store.save(LEDGER_KEY, &blob));
        match result {
            Ok(()) => self.dirty = false,
            Err(e) => {
                warn!(error = %e, "failed to persist ledger; continuing in memory");
                self.dirty = true;
            }
        }
    }

    /// Returns true when a pending write was flushed.
    pub fn persist_if_dirty(&mut self) -> bool {
        if !self.dirty {
            return false;
        }
        self.persist();
        !self.dirty
    }

    fn log(&mut self, amount: Decimal, entry: TxEntry) -> Transaction {
        let tx = Transaction {
            ts: self.clock.now(),
            amount,
            entry,
        };
        self.state.transactions.push(tx.clone());
        tx
    }

    fn next_sip_id(&self, now: DateTime<Utc>) -> String {
        let mut at = now;
        loop {
            let id = format!("SIP-{}", at.timestamp_millis());
            if !self.state.sips.iter().any(|s| s.id == id) {
                return id;
            }
            at += Duration::milliseconds(1);
        }
    }
}

fn fund_nav(prices: &dyn PriceSource, fund_id: &str) -> Result<(String, Decimal), LedgerError> {
    let fund = prices
        .catalog()
        .fund(fund_id)
        .ok_or_else(|| LedgerError::UnknownInstrument(fund_id.to_string()))?;
    let nav = fund
        .price()
        .filter(|n| *n > Decimal::ZERO)
        .ok_or_else(|| LedgerError::UnknownInstrument(fund_id.to_string()))?;
    Ok((fund.name.clone(), nav))
}

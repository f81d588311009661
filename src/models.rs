// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named price horizon. Every instrument carries one independent history per timeframe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "1D")]
    Day,
    #[serde(rename = "1W")]
    Week,
    #[serde(rename = "1M")]
    Month,
    #[serde(rename = "1Y")]
    Year,
}

impl Timeframe {
    pub const ALL: [Timeframe; 4] = [
        Timeframe::Day,
        Timeframe::Week,
        Timeframe::Month,
        Timeframe::Year,
    ];

    /// The fastest series; funds are always priced from it.
    pub const PRIMARY: Timeframe = Timeframe::Day;

    pub fn label(self) -> &'static str {
        match self {
            Timeframe::Day => "1D",
            Timeframe::Week => "1W",
            Timeframe::Month => "1M",
            Timeframe::Year => "1Y",
        }
    }

    /// Simulated series advance once every `cadence()` ticks.
    pub fn cadence(self) -> u64 {
        match self {
            Timeframe::Day => 1,
            Timeframe::Week => 5,
            Timeframe::Month => 15,
            Timeframe::Year => 60,
        }
    }

    /// Per-tick perturbation width (percent) used by the simulated feed.
    /// Faster series move more per tick than slower ones.
    pub fn tick_volatility(self) -> Decimal {
        match self {
            Timeframe::Day => dec!(0.9),
            Timeframe::Week => dec!(0.25),
            Timeframe::Month => dec!(0.08),
            Timeframe::Year => dec!(0.02),
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1D" => Ok(Timeframe::Day),
            "1W" => Ok(Timeframe::Week),
            "1M" => Ok(Timeframe::Month),
            "1Y" => Ok(Timeframe::Year),
            other => Err(format!("Unknown timeframe '{}', expected 1D|1W|1M|1Y", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstrumentKind {
    Equity,
    Fund,
}

/// Asset class recorded on a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Stock,
    Fund,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Stock => "stock",
            AssetKind::Fund => "fund",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPosition {
    pub quantity: u64,
    pub avg_cost: Decimal,
}

impl EquityPosition {
    pub fn invested(&self) -> Decimal {
        Decimal::from(self.quantity) * self.avg_cost
    }

    pub fn market_value(&self, price: Decimal) -> Decimal {
        Decimal::from(self.quantity) * price
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundPosition {
    /// Always stored rounded to 3 decimal places.
    pub units: Decimal,
    pub avg_cost: Decimal,
}

impl FundPosition {
    pub fn invested(&self) -> Decimal {
        self.units * self.avg_cost
    }

    pub fn market_value(&self, nav: Decimal) -> Decimal {
        self.units * nav
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SipFrequency {
    #[default]
    Monthly,
    Quarterly,
}

impl SipFrequency {
    pub fn as_str(self) -> &'static str {
        match self {
            SipFrequency::Monthly => "monthly",
            SipFrequency::Quarterly => "quarterly",
        }
    }
}

impl FromStr for SipFrequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" => Ok(SipFrequency::Monthly),
            "quarterly" => Ok(SipFrequency::Quarterly),
            other => Err(format!(
                "Unknown SIP frequency '{}', expected monthly|quarterly",
                other
            )),
        }
    }
}

/// Systematic investment plan record. Instalments are not executed automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sip {
    pub id: String,
    pub fund_id: String,
    pub amount: Decimal,
    pub started_at: DateTime<Utc>,
    pub frequency: SipFrequency,
    /// Annual step-up percentage; zero disables step-up.
    pub step_up_pct: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedeemMode {
    ByAmount,
    ByUnits,
}

impl FromStr for RedeemMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amount" | "by-amount" => Ok(RedeemMode::ByAmount),
            "units" | "by-units" => Ok(RedeemMode::ByUnits),
            other => Err(format!("Unknown redeem mode '{}', expected amount|units", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityFill {
    pub instrument_id: String,
    pub name: String,
    pub quantity: u64,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundFill {
    pub fund_id: String,
    pub name: String,
    pub units: Decimal,
    pub nav: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TxEntry {
    Buy(EquityFill),
    Sell(EquityFill),
    Invest(FundFill),
    Redeem(FundFill),
    SipStart {
        fund_id: String,
        name: String,
        sip_id: String,
    },
}

/// Immutable log record. `amount` is signed: negative is a cash outflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub ts: DateTime<Utc>,
    pub amount: Decimal,
    pub entry: TxEntry,
}

impl Transaction {
    pub fn type_label(&self) -> &'static str {
        match self.entry {
            TxEntry::Buy(_) => "buy",
            TxEntry::Sell(_) => "sell",
            TxEntry::Invest(_) => "invest",
            TxEntry::Redeem(_) => "redeem",
            TxEntry::SipStart { .. } => "sip_start",
        }
    }

    pub fn asset_kind(&self) -> AssetKind {
        match self.entry {
            TxEntry::Buy(_) | TxEntry::Sell(_) => AssetKind::Stock,
            _ => AssetKind::Fund,
        }
    }

    pub fn instrument_id(&self) -> &str {
        match &self.entry {
            TxEntry::Buy(f) | TxEntry::Sell(f) => &f.instrument_id,
            TxEntry::Invest(f) | TxEntry::Redeem(f) => &f.fund_id,
            TxEntry::SipStart { fund_id, .. } => fund_id,
        }
    }

    pub fn name(&self) -> &str {
        match &self.entry {
            TxEntry::Buy(f) | TxEntry::Sell(f) => &f.name,
            TxEntry::Invest(f) | TxEntry::Redeem(f) => &f.name,
            TxEntry::SipStart { name, .. } => name,
        }
    }

    /// Cash actually moved. A SIP start records the instalment but debits nothing.
    pub fn cash_effect(&self) -> Decimal {
        match self.entry {
            TxEntry::SipStart { .. } => Decimal::ZERO,
            _ => self.amount,
        }
    }
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::{Transaction, TxEntry};
use crate::utils::{fmt_inr_signed, maybe_print_json, pretty_table};
use anyhow::{Context, Result};

/// Quantity column: shares, or units to three places.
pub(crate) fn quantity_text(tx: &Transaction) -> String {
    match &tx.entry {
        TxEntry::Buy(f) | TxEntry::Sell(f) => f.quantity.to_string(),
        TxEntry::Invest(f) | TxEntry::Redeem(f) => format!("{:.3}", f.units),
        TxEntry::SipStart { .. } => String::new(),
    }
}

/// Execution price or NAV, empty for SIP starts.
pub(crate) fn price_text(tx: &Transaction) -> String {
    match &tx.entry {
        TxEntry::Buy(f) | TxEntry::Sell(f) => format!("{:.2}", f.price),
        TxEntry::Invest(f) | TxEntry::Redeem(f) => format!("{:.2}", f.nav),
        TxEntry::SipStart { .. } => String::new(),
    }
}

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let limit = m
        .get_one::<String>("limit")
        .map(|s| s.trim().parse::<usize>())
        .transpose()
        .context("Invalid --limit, expected a whole number")?;
    let mut txs = app.ledger.transactions_newest_first();
    if let Some(n) = limit {
        txs.truncate(n);
    }
    if maybe_print_json(m.get_flag("json"), &txs)? {
        return Ok(());
    }
    if txs.is_empty() {
        println!("No transactions yet");
        return Ok(());
    }
    let data = txs
        .iter()
        .map(|t| {
            vec![
                t.ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                t.type_label().to_string(),
                t.asset_kind().as_str().to_string(),
                t.instrument_id().to_string(),
                t.name().to_string(),
                quantity_text(t),
                price_text(t),
                fmt_inr_signed(t.amount),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Time", "Type", "Kind", "Id", "Name", "Qty", "Price", "Amount"],
            data
        )
    );
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::utils::{
    arg_str, fmt_inr, fmt_inr_signed, maybe_print_json, parse_decimal, pretty_table,
};
use crate::valuation::{holdings, net_worth, portfolio_summary};
use anyhow::Result;
use serde_json::json;

pub fn balance(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    if let Some(("add", sub)) = m.subcommand() {
        let amount = parse_decimal(arg_str(sub, "amount")?)?;
        let balance = app.ledger.add_cash(amount)?;
        println!("Added {} (balance {})", fmt_inr(amount), fmt_inr(balance));
        return Ok(());
    }
    let state = app.ledger.state();
    let summary = portfolio_summary(state, app.feed.as_ref());
    println!(
        "{}",
        pretty_table(
            &["Cash", "Invested", "Value", "P/L", "Net worth"],
            vec![vec![
                fmt_inr(state.balance),
                fmt_inr(summary.invested_cost),
                fmt_inr(summary.market_value),
                fmt_inr_signed(summary.profit_loss()),
                fmt_inr(net_worth(state, app.feed.as_ref())),
            ]],
        )
    );
    Ok(())
}

pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let state = app.ledger.state();
    let rows = holdings(state, app.feed.as_ref());
    let summary = portfolio_summary(state, app.feed.as_ref());
    if maybe_print_json(
        m.get_flag("json"),
        &json!({
            "timeframe": state.prefs.timeframe.label(),
            "balance": state.balance,
            "invested_cost": summary.invested_cost,
            "market_value": summary.market_value,
            "profit_loss": summary.profit_loss(),
            "holdings": rows,
        }),
    )? {
        return Ok(());
    }
    if rows.is_empty() {
        println!("No holdings. Cash {}", fmt_inr(state.balance));
        return Ok(());
    }
    let data = rows
        .iter()
        .map(|r| {
            vec![
                r.kind.as_str().to_string(),
                r.id.clone(),
                r.name.clone(),
                r.quantity.normalize().to_string(),
                format!("{:.2}", r.avg_cost),
                format!("{:.2}", r.price),
                fmt_inr(r.invested),
                fmt_inr(r.value),
                fmt_inr_signed(r.profit_loss()),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Kind", "Id", "Name", "Qty", "Avg", "Price", "Invested", "Value", "P/L"],
            data
        )
    );
    println!(
        "Invested {}  Value {}  P/L {}",
        fmt_inr(summary.invested_cost),
        fmt_inr(summary.market_value),
        fmt_inr_signed(summary.profit_loss())
    );
    Ok(())
}

pub fn reset(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    if !m.get_flag("yes") {
        println!("This clears every position, SIP and transaction. Re-run with --yes to confirm.");
        return Ok(());
    }
    app.ledger.reset();
    println!("Ledger reset. Cash {}", fmt_inr(app.ledger.balance()));
    Ok(())
}

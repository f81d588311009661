// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::ledger::FUND_DUST_UNITS;
use crate::models::RedeemMode;
use crate::utils::{arg_str, fmt_inr, fmt_pct, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Result, bail};
use serde_json::json;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(app, sub)?,
        Some(("invest", sub)) => invest(app, sub)?,
        Some(("redeem", sub)) => redeem(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let mut items = Vec::new();
    let mut data = Vec::new();
    for fund in app.feed.catalog().funds() {
        let Some(nav) = fund.price() else {
            continue;
        };
        let units = app
            .ledger
            .fund_holding(&fund.id)
            .map(|p| p.units)
            .unwrap_or_default();
        items.push(json!({
            "id": fund.id, "name": fund.name, "nav": nav, "change_pct": fund.change_pct,
            "one_year_return": fund.one_year_return, "units": units
        }));
        data.push(vec![
            fund.id.clone(),
            fund.name.clone(),
            format!("{:.2}", nav),
            fmt_pct(fund.change_pct),
            fund.one_year_return.map(fmt_pct).unwrap_or_default(),
            if units >= FUND_DUST_UNITS {
                format!("{:.3}", units)
            } else {
                String::new()
            },
        ]);
    }
    if maybe_print_json(sub.get_flag("json"), &items)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(&["Id", "Name", "NAV", "Change", "1Y", "Units"], data)
    );
    Ok(())
}

fn invest(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim().to_uppercase();
    let amount = parse_decimal(arg_str(sub, "amount")?)?;
    let exec = app.ledger.invest_fund(app.feed.as_ref(), &id, amount)?;
    let units = exec.position.map(|p| p.units).unwrap_or_default();
    println!(
        "Invested {} in {} ({:.3} units held, balance {})",
        fmt_inr(amount),
        id,
        units,
        fmt_inr(exec.balance)
    );
    Ok(())
}

fn redeem(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim().to_uppercase();
    let (mode, raw) = match (sub.get_one::<String>("amount"), sub.get_one::<String>("units")) {
        (Some(a), None) => (RedeemMode::ByAmount, a),
        (None, Some(u)) => (RedeemMode::ByUnits, u),
        _ => bail!("Pass exactly one of --amount or --units"),
    };
    let value = parse_decimal(raw)?;
    let exec = app.ledger.redeem_fund(app.feed.as_ref(), &id, value, mode)?;
    let left = exec.position.map(|p| p.units).unwrap_or_default();
    println!(
        "Redeemed {} from {} ({:.3} units left, balance {})",
        fmt_inr(exec.transaction.amount),
        id,
        left,
        fmt_inr(exec.balance)
    );
    Ok(())
}

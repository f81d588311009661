// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::Timeframe;
use crate::utils::{arg_str, fmt_inr, fmt_pct, maybe_print_json, parse_quantity, pretty_table};
use anyhow::{Result, anyhow};
use serde_json::json;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("list", sub)) => list(app, sub)?,
        Some(("show", sub)) => show(app, sub)?,
        Some(("buy", sub)) => buy(app, sub)?,
        Some(("sell", sub)) => sell(app, sub)?,
        _ => {}
    }
    Ok(())
}

fn timeframe_or_active(app: &App, sub: &clap::ArgMatches) -> Result<Timeframe> {
    match sub.get_one::<String>("timeframe") {
        Some(raw) => raw.parse::<Timeframe>().map_err(anyhow::Error::msg),
        None => Ok(app.ledger.timeframe()),
    }
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let tf = app.ledger.timeframe();
    let watched_only = sub.get_flag("watched");
    let watchlist = app.ledger.watchlist();
    let mut items = Vec::new();
    let mut data = Vec::new();
    for inst in app.feed.catalog().equities() {
        let watched = watchlist.iter().any(|w| w == &inst.id);
        if watched_only && !watched {
            continue;
        }
        let Some(price) = inst.latest(tf) else {
            continue;
        };
        let held = app.ledger.holding(&inst.id).map(|p| p.quantity).unwrap_or(0);
        items.push(json!({
            "id": inst.id, "name": inst.name, "timeframe": tf.label(),
            "price": price, "change_pct": inst.change_pct, "watched": watched, "held": held
        }));
        data.push(vec![
            inst.id.clone(),
            inst.name.clone(),
            format!("{:.2}", price),
            fmt_pct(inst.change_pct),
            if watched { "*".into() } else { String::new() },
            if held > 0 { held.to_string() } else { String::new() },
        ]);
    }
    if maybe_print_json(sub.get_flag("json"), &items)? {
        return Ok(());
    }
    println!("Prices at {}", tf);
    println!(
        "{}",
        pretty_table(&["Id", "Name", "Price", "Change", "Watch", "Held"], data)
    );
    Ok(())
}

fn show(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim().to_uppercase();
    let tf = timeframe_or_active(app, sub)?;
    let inst = app
        .feed
        .catalog()
        .equity(&id)
        .ok_or_else(|| anyhow!("Unknown equity '{}'", id))?;
    let points = app.feed.history(&id, tf).unwrap_or_default();
    if maybe_print_json(
        sub.get_flag("json"),
        &json!({ "id": inst.id, "name": inst.name, "timeframe": tf.label(), "points": points }),
    )? {
        return Ok(());
    }
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        println!("No {} history for {}", tf, id);
        return Ok(());
    };
    let low = points.iter().min().copied().unwrap_or(*last);
    let high = points.iter().max().copied().unwrap_or(*last);
    println!("{} ({}) at {}", inst.name, inst.id, tf);
    println!(
        "{}",
        pretty_table(
            &["Latest", "Change", "Low", "High", "Points"],
            vec![vec![
                format!("{:.2}", last),
                fmt_pct(inst.change_pct),
                format!("{:.2}", low),
                format!("{:.2}", high),
                points.len().to_string(),
            ]],
        )
    );
    if !first.is_zero() {
        println!("Over window: {}", fmt_pct((*last - *first) / *first * rust_decimal::Decimal::ONE_HUNDRED));
    }
    Ok(())
}

fn buy(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim().to_uppercase();
    let quantity = parse_quantity(arg_str(sub, "quantity")?)?;
    let exec = app.ledger.buy_equity(app.feed.as_ref(), &id, quantity)?;
    println!(
        "Bought {} {} for {} (balance {})",
        quantity,
        id,
        fmt_inr(-exec.transaction.amount),
        fmt_inr(exec.balance)
    );
    Ok(())
}

fn sell(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim().to_uppercase();
    let quantity = parse_quantity(arg_str(sub, "quantity")?)?;
    let exec = app.ledger.sell_equity(app.feed.as_ref(), &id, quantity)?;
    let left = exec.position.map(|p| p.quantity).unwrap_or(0);
    println!(
        "Sold {} {} for {} ({} left, balance {})",
        quantity,
        id,
        fmt_inr(exec.transaction.amount),
        left,
        fmt_inr(exec.balance)
    );
    Ok(())
}

/// Synthetic index over the large-cap constituents.
pub fn index(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let tf = timeframe_or_active(app, sub)?;
    let series = app.feed.catalog().index_series(tf);
    if maybe_print_json(
        sub.get_flag("json"),
        &json!({ "timeframe": tf.label(), "points": series }),
    )? {
        return Ok(());
    }
    match (series.last(), series.len().checked_sub(2).and_then(|i| series.get(i))) {
        (Some(last), Some(prev)) if !prev.is_zero() => {
            println!(
                "Index {} ({}) at {}",
                last,
                fmt_pct((*last - *prev) / *prev * rust_decimal::Decimal::ONE_HUNDRED),
                tf
            );
        }
        (Some(last), _) => println!("Index {} at {}", last, tf),
        (None, _) => println!("No index data at {}", tf),
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::SipFrequency;
use crate::sip_calc;
use crate::utils::{arg_str, fmt_inr, maybe_print_json, parse_decimal, pretty_table};
use anyhow::{Context, Result, bail};

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("start", sub)) => start(app, sub)?,
        Some(("stop", sub)) => stop(app, sub)?,
        Some(("list", sub)) => list(app, sub)?,
        Some(("calc", sub)) => calc(sub)?,
        _ => {}
    }
    Ok(())
}

fn start(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let fund_id = arg_str(sub, "id")?.trim().to_uppercase();
    let amount = parse_decimal(arg_str(sub, "amount")?)?;
    let frequency = arg_str(sub, "frequency")?
        .parse::<SipFrequency>()
        .map_err(anyhow::Error::msg)?;
    let step_up = parse_decimal(arg_str(sub, "step_up")?)?;
    let invest_now = sub.get_flag("invest_now");
    let started = app.ledger.start_sip(
        app.feed.as_ref(),
        &fund_id,
        amount,
        frequency,
        step_up,
        invest_now,
    )?;
    println!(
        "Started {} SIP {} of {} into {}",
        started.sip.frequency.as_str(),
        started.sip.id,
        fmt_inr(amount),
        fund_id
    );
    if let Some(exec) = started.investment {
        println!("First instalment invested (balance {})", fmt_inr(exec.balance));
    }
    Ok(())
}

fn stop(app: &mut App, sub: &clap::ArgMatches) -> Result<()> {
    let id = arg_str(sub, "id")?.trim();
    if app.ledger.stop_sip(id) {
        println!("Stopped SIP {}", id);
    } else {
        println!("No active SIP {}", id);
    }
    Ok(())
}

fn list(app: &App, sub: &clap::ArgMatches) -> Result<()> {
    let sips = app.ledger.sips();
    if maybe_print_json(sub.get_flag("json"), &sips)? {
        return Ok(());
    }
    if sips.is_empty() {
        println!("No active SIPs");
        return Ok(());
    }
    let data = sips
        .iter()
        .map(|s| {
            let name = app
                .feed
                .catalog()
                .fund(&s.fund_id)
                .map(|f| f.name.clone())
                .unwrap_or_else(|| s.fund_id.clone());
            vec![
                s.id.clone(),
                name,
                fmt_inr(s.amount),
                s.frequency.as_str().to_string(),
                format!("{}%", s.step_up_pct),
                s.started_at.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Fund", "Amount", "Frequency", "Step-up", "Started"],
            data
        )
    );
    Ok(())
}

fn calc(sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(arg_str(sub, "amount")?)?;
    let rate = parse_decimal(arg_str(sub, "rate")?)?;
    let years = arg_str(sub, "years")?
        .trim()
        .parse::<u32>()
        .context("Invalid years, expected a whole number")?;
    if amount <= rust_decimal::Decimal::ZERO {
        bail!("Monthly amount must be positive");
    }
    let p = sip_calc::project(amount, rate, years)?;
    if maybe_print_json(sub.get_flag("json"), &p)? {
        return Ok(());
    }
    println!(
        "{}",
        pretty_table(
            &["Invested", "Expected", "Gain"],
            vec![vec![fmt_inr(p.invested), fmt_inr(p.expected), fmt_inr(p.gain)]],
        )
    );
    let yearly: Vec<Vec<String>> = p
        .monthly
        .chunks(12)
        .enumerate()
        .filter_map(|(y, months)| {
            months
                .last()
                .map(|v| vec![format!("{}", y + 1), fmt_inr(*v)])
        })
        .collect();
    if !yearly.is_empty() {
        println!("{}", pretty_table(&["Year", "Value"], yearly));
    }
    Ok(())
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::scheduler::Scheduler;
use crate::utils::{fmt_inr, fmt_inr_signed};
use anyhow::{Context, Result};
use tracing::info;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    let max_ticks = m
        .get_one::<String>("ticks")
        .map(|s| s.trim().parse::<u64>())
        .transpose()
        .context("Invalid --ticks, expected a whole number")?;
    let mut scheduler = Scheduler::new(app.clock.clone(), app.config.tick_interval);
    info!(feed = app.feed.name(), ?max_ticks, "starting price feed");
    let (ledger, feed) = app.parts();
    scheduler.run(ledger, feed, max_ticks, |report, _, _| {
        println!(
            "#{:<5} {}  value {}  P/L {}  net worth {}",
            report.seq,
            report.at.format("%H:%M:%S"),
            fmt_inr(report.summary.market_value),
            fmt_inr_signed(report.summary.profit_loss()),
            fmt_inr(report.net_worth)
        );
    });
    ledger.persist_if_dirty();
    Ok(())
}

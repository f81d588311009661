// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::utils::{arg_str, fmt_pct, pretty_table};
use anyhow::Result;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("toggle", sub)) => {
            let id = arg_str(sub, "id")?.trim().to_uppercase();
            if app.ledger.toggle_watch(app.feed.as_ref(), &id)? {
                println!("Watching {}", id);
            } else {
                println!("Removed {} from the watchlist", id);
            }
        }
        Some(("list", _)) => list(app),
        _ => {}
    }
    Ok(())
}

fn list(app: &App) {
    let tf = app.ledger.timeframe();
    let data: Vec<Vec<String>> = app
        .ledger
        .watchlist()
        .iter()
        .filter_map(|id| app.feed.catalog().equity(id))
        .map(|inst| {
            vec![
                inst.id.clone(),
                inst.name.clone(),
                inst.latest(tf).map(|p| format!("{:.2}", p)).unwrap_or_default(),
                fmt_pct(inst.change_pct),
            ]
        })
        .collect();
    if data.is_empty() {
        println!("Watchlist is empty");
        return;
    }
    println!("{}", pretty_table(&["Id", "Name", "Price", "Change"], data));
}

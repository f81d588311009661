// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::models::Timeframe;
use crate::utils::{arg_str, pretty_table};
use anyhow::Result;

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("timeframe", sub)) => {
            let tf = arg_str(sub, "value")?
                .parse::<Timeframe>()
                .map_err(anyhow::Error::msg)?;
            app.ledger.set_timeframe(tf);
            println!("Equities now priced at {}", tf);
        }
        Some(("live", sub)) => {
            let on = arg_str(sub, "value")? == "on";
            app.ledger.set_live_enabled(on);
            app.feed.set_live_enabled(on);
            if on && app.ledger.prefs().quote_api_key.is_none() && app.config.quote_api_key.is_none() {
                println!("Live quotes enabled; set a key with `prefs key <KEY>` to fetch them");
            } else {
                println!("Live quotes {}", if on { "enabled" } else { "disabled" });
            }
        }
        Some(("key", sub)) => {
            let key = sub.get_one::<String>("value").cloned();
            let cleared = key.as_deref().is_none_or(|k| k.trim().is_empty());
            app.ledger.set_quote_api_key(key);
            println!("Quote API key {}", if cleared { "cleared" } else { "saved" });
        }
        _ => show(app),
    }
    Ok(())
}

fn show(app: &App) {
    let prefs = app.ledger.prefs();
    println!(
        "{}",
        pretty_table(
            &["Timeframe", "Live", "API key", "Feed"],
            vec![vec![
                prefs.timeframe.label().to_string(),
                if prefs.live_enabled { "on" } else { "off" }.to_string(),
                if prefs.quote_api_key.is_some() { "set" } else { "unset" }.to_string(),
                app.feed.name().to_string(),
            ]],
        )
    );
}

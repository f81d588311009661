// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use sipfolio::{app::App, cli, commands, config::Config};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SIPFOLIO_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = Config::from_env()?;
    let mut app = App::open(config)?;

    match matches.subcommand() {
        Some(("balance", sub)) => commands::portfolio::balance(&mut app, sub)?,
        Some(("stocks", sub)) => commands::stocks::handle(&mut app, sub)?,
        Some(("funds", sub)) => commands::funds::handle(&mut app, sub)?,
        Some(("sip", sub)) => commands::sips::handle(&mut app, sub)?,
        Some(("portfolio", sub)) => commands::portfolio::handle(&app, sub)?,
        Some(("history", sub)) => commands::transactions::handle(&app, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&app, sub)?,
        Some(("watch", sub)) => commands::watchlist::handle(&mut app, sub)?,
        Some(("prefs", sub)) => commands::prefs::handle(&mut app, sub)?,
        Some(("reset", sub)) => commands::portfolio::reset(&mut app, sub)?,
        Some(("run", sub)) => commands::ticker::handle(&mut app, sub)?,
        Some(("index", sub)) => commands::stocks::index(&app, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    app.ledger.persist_if_dirty();
    Ok(())
}

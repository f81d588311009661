// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::commands::transactions::{price_text, quantity_text};
use crate::utils::arg_str;
use anyhow::{Context, Result, bail};
use serde_json::json;

const HEADERS: [&str; 8] = [
    "timestamp", "type", "kind", "id", "name", "quantity", "price", "amount",
];

/// Writes the transaction log, oldest first, as CSV or JSON.
pub fn handle(app: &App, m: &clap::ArgMatches) -> Result<()> {
    let fmt = arg_str(m, "format")?.to_lowercase();
    let out = arg_str(m, "out")?;
    let rows: Vec<[String; 8]> = app
        .ledger
        .transactions()
        .iter()
        .map(|t| {
            [
                t.ts.to_rfc3339(),
                t.type_label().to_string(),
                t.asset_kind().as_str().to_string(),
                t.instrument_id().to_string(),
                t.name().to_string(),
                quantity_text(t),
                price_text(t),
                t.amount.to_string(),
            ]
        })
        .collect();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Cannot create {}", out))?;
            wtr.write_record(HEADERS)?;
            for row in &rows {
                wtr.write_record(row)?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<serde_json::Value> = rows
                .into_iter()
                .map(|[ts, ty, kind, id, name, qty, price, amount]| {
                    json!({
                        "timestamp": ts, "type": ty, "kind": kind, "id": id, "name": name,
                        "quantity": qty, "price": price, "amount": amount
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Cannot write {}", out))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported transactions to {}", out);
    Ok(())
}

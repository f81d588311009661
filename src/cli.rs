// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, ArgGroup, Command, crate_version};

fn json_flag() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print JSON instead of a table")
}

fn id_arg(help: &'static str) -> Arg {
    Arg::new("id").required(true).help(help)
}

pub fn build_cli() -> Command {
    Command::new("sipfolio")
        .about("Simulated stock and mutual fund ledger with SIPs")
        .version(crate_version!())
        .subcommand_required(false)
        .subcommand(
            Command::new("balance")
                .about("Show cash, invested cost, value and net worth")
                .subcommand(
                    Command::new("add")
                        .about("Deposit cash")
                        .arg(Arg::new("amount").required(true).help("Whole rupees")),
                ),
        )
        .subcommand(
            Command::new("stocks")
                .about("Equity market")
                .subcommand(
                    Command::new("list")
                        .about("List equities at the active timeframe")
                        .arg(
                            Arg::new("watched")
                                .long("watched")
                                .action(ArgAction::SetTrue)
                                .help("Only equities on the watchlist"),
                        )
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("show")
                        .about("Show an equity's price history")
                        .arg(id_arg("Equity id, e.g. TCS"))
                        .arg(
                            Arg::new("timeframe")
                                .long("timeframe")
                                .short('t')
                                .help("1D|1W|1M|1Y (defaults to the active timeframe)"),
                        )
                        .arg(json_flag()),
                )
                .subcommand(
                    Command::new("buy")
                        .about("Buy whole shares at the current price")
                        .arg(id_arg("Equity id"))
                        .arg(Arg::new("quantity").required(true)),
                )
                .subcommand(
                    Command::new("sell")
                        .about("Sell whole shares at the current price")
                        .arg(id_arg("Equity id"))
                        .arg(Arg::new("quantity").required(true)),
                ),
        )
        .subcommand(
            Command::new("funds")
                .about("Mutual funds")
                .subcommand(Command::new("list").about("List funds with NAV").arg(json_flag()))
                .subcommand(
                    Command::new("invest")
                        .about("Invest a lump sum at the current NAV")
                        .arg(id_arg("Fund id"))
                        .arg(Arg::new("amount").required(true)),
                )
                .subcommand(
                    Command::new("redeem")
                        .about("Redeem by amount or by units")
                        .arg(id_arg("Fund id"))
                        .arg(Arg::new("amount").long("amount"))
                        .arg(Arg::new("units").long("units"))
                        .group(
                            ArgGroup::new("by")
                                .args(["amount", "units"])
                                .required(true),
                        ),
                ),
        )
        .subcommand(
            Command::new("sip")
                .about("Systematic investment plans")
                .subcommand(
                    Command::new("start")
                        .about("Start a SIP into a fund")
                        .arg(id_arg("Fund id"))
                        .arg(Arg::new("amount").required(true))
                        .arg(
                            Arg::new("frequency")
                                .long("frequency")
                                .default_value("monthly")
                                .help("monthly|quarterly"),
                        )
                        .arg(
                            Arg::new("step_up")
                                .long("step-up")
                                .default_value("0")
                                .help("Annual step-up percentage"),
                        )
                        .arg(
                            Arg::new("invest_now")
                                .long("invest-now")
                                .action(ArgAction::SetTrue)
                                .help("Also invest the first instalment immediately"),
                        ),
                )
                .subcommand(
                    Command::new("stop")
                        .about("Stop a SIP")
                        .arg(id_arg("SIP id")),
                )
                .subcommand(Command::new("list").about("List active SIPs").arg(json_flag()))
                .subcommand(
                    Command::new("calc")
                        .about("Project the future value of a monthly SIP")
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(
                            Arg::new("rate")
                                .long("rate")
                                .default_value("12")
                                .help("Expected annual return in percent"),
                        )
                        .arg(Arg::new("years").long("years").default_value("10"))
                        .arg(json_flag()),
                ),
        )
        .subcommand(
            Command::new("portfolio")
                .about("Holdings with invested cost, value and P/L")
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("history")
                .about("Transactions, newest first")
                .arg(Arg::new("limit").long("limit").help("Show at most N entries"))
                .arg(json_flag()),
        )
        .subcommand(
            Command::new("export")
                .about("Export the transaction log")
                .arg(
                    Arg::new("format")
                        .long("format")
                        .required(true)
                        .help("csv|json"),
                )
                .arg(Arg::new("out").long("out").required(true)),
        )
        .subcommand(
            Command::new("watch")
                .about("Watchlist")
                .subcommand(
                    Command::new("toggle")
                        .about("Add or remove an equity")
                        .arg(id_arg("Equity id")),
                )
                .subcommand(Command::new("list").about("Show the watchlist")),
        )
        .subcommand(
            Command::new("prefs")
                .about("Preferences")
                .subcommand(Command::new("show").about("Show current preferences"))
                .subcommand(
                    Command::new("timeframe")
                        .about("Set the timeframe used to price equities")
                        .arg(Arg::new("value").required(true).help("1D|1W|1M|1Y")),
                )
                .subcommand(
                    Command::new("live")
                        .about("Enable or disable live quotes")
                        .arg(
                            Arg::new("value")
                                .required(true)
                                .value_parser(["on", "off"]),
                        ),
                )
                .subcommand(
                    Command::new("key")
                        .about("Set or clear the quote API key")
                        .arg(Arg::new("value").help("API key; omit to clear")),
                ),
        )
        .subcommand(
            Command::new("reset")
                .about("Restore the default balance and clear everything")
                .arg(
                    Arg::new("yes")
                        .long("yes")
                        .action(ArgAction::SetTrue)
                        .help("Skip the confirmation notice"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Drive the price feed in real time")
                .arg(
                    Arg::new("ticks")
                        .long("ticks")
                        .help("Stop after N ticks (runs until interrupted otherwise)"),
                ),
        )
        .subcommand(
            Command::new("index")
                .about("Synthetic market index")
                .arg(
                    Arg::new("timeframe")
                        .long("timeframe")
                        .short('t')
                        .help("1D|1W|1M|1Y (defaults to the active timeframe)"),
                )
                .arg(json_flag()),
        )
}

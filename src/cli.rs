// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, value_parser};

fn json_args(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print as pretty JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print as JSON lines"),
    )
}

fn month_arg(required: bool) -> Arg {
    Arg::new("month")
        .long("month")
        .value_name("YYYY-MM")
        .required(required)
}

pub fn build_cli() -> Command {
    Command::new("budgetwatch")
        .about("Two-currency household budgets with threshold alerts")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Debug logging"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .global(true)
                .action(ArgAction::SetTrue)
                .conflicts_with("verbose")
                .help("Only log errors"),
        )
        .subcommand(Command::new("init").about("Create the database"))
        .subcommand(
            Command::new("tx")
                .about("Income and expense transactions")
                .subcommand(
                    Command::new("add")
                        .arg(
                            Arg::new("type")
                                .long("type")
                                .required(true)
                                .value_parser(["income", "expense"]),
                        )
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("currency").long("currency").default_value("XOF"))
                        .arg(
                            Arg::new("date")
                                .long("date")
                                .required(true)
                                .value_name("YYYY-MM-DD"),
                        )
                        .arg(Arg::new("source").long("source").help("Income source label")),
                )
                .subcommand(json_args(
                    Command::new("list")
                        .arg(month_arg(false))
                        .arg(Arg::new("category").long("category"))
                        .arg(
                            Arg::new("limit")
                                .long("limit")
                                .value_parser(value_parser!(usize)),
                        ),
                ))
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("budget")
                .about("Monthly category budgets")
                .subcommand(
                    Command::new("set")
                        .arg(month_arg(true))
                        .arg(Arg::new("category").long("category").required(true))
                        .arg(Arg::new("amount").long("amount").required(true))
                        .arg(Arg::new("currency").long("currency").default_value("XOF")),
                )
                .subcommand(json_args(Command::new("list").arg(month_arg(false))))
                .subcommand(json_args(
                    Command::new("report")
                        .arg(month_arg(true))
                        .arg(Arg::new("currency").long("currency")),
                ))
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("alert")
                .about("Budget threshold alerts")
                .subcommand(json_args(
                    Command::new("check")
                        .about("Evaluate budgets for a month and raise alerts")
                        .arg(month_arg(true)),
                ))
                .subcommand(json_args(
                    Command::new("list")
                        .arg(month_arg(false))
                        .arg(
                            Arg::new("unread")
                                .long("unread")
                                .action(ArgAction::SetTrue),
                        ),
                ))
                .subcommand(
                    Command::new("read")
                        .arg(
                            Arg::new("id")
                                .value_parser(value_parser!(i64))
                                .required_unless_present("all"),
                        )
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .conflicts_with("id"),
                        )
                        .arg(month_arg(false).requires("all")),
                )
                .subcommand(
                    Command::new("rm").arg(
                        Arg::new("id")
                            .required(true)
                            .value_parser(value_parser!(i64)),
                    ),
                ),
        )
        .subcommand(
            Command::new("fx")
                .about("Fixed-rate currency conversion")
                .subcommand(Command::new("rates"))
                .subcommand(
                    Command::new("convert")
                        .arg(Arg::new("amount").required(true))
                        .arg(Arg::new("from").long("from").required(true))
                        .arg(Arg::new("to").long("to").required(true)),
                ),
        )
        .subcommand(
            Command::new("config")
                .about("Persisted settings")
                .subcommand(Command::new("get").arg(Arg::new("key").required(true)))
                .subcommand(
                    Command::new("set")
                        .arg(Arg::new("key").required(true))
                        .arg(Arg::new("value").required(true)),
                )
                .subcommand(json_args(Command::new("list"))),
        )
        .subcommand(Command::new("doctor").about("Check stored data for inconsistencies"))
}

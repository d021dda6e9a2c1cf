// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::currency::{Currency, convert, rate};
use crate::utils::{parse_currency, parse_decimal, pretty_table, required};
use anyhow::Result;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("rates", _)) => list_rates(),
        Some(("convert", sub)) => convert_amount(sub)?,
        _ => {}
    }
    Ok(())
}

fn list_rates() {
    let base = Currency::base();
    let data = Currency::ALL
        .iter()
        .map(|c| vec![c.to_string(), base.to_string(), rate(*c).to_string()])
        .collect();
    println!(
        "{}",
        pretty_table(&["Currency", "Base", "Units of base per unit"], data)
    );
}

fn convert_amount(sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(required(sub, "amount")?)?;
    let from = parse_currency(required(sub, "from")?)?;
    let to = parse_currency(required(sub, "to")?)?;
    let res = convert(amount, from, to);
    println!("{} {} -> {:.4} {}", amount, from, res, to);
    Ok(())
}

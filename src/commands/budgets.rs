// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::alerts::{evaluate, summarize};
use crate::config::Settings;
use crate::currency::{Currency, convert, fmt_money};
use crate::store::{AlertStore, SqliteStore};
use crate::utils::{
    maybe_print_json, parse_currency, parse_decimal, parse_period, pretty_table, required,
    required_id,
};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::Serialize;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("report", sub)) => report(conn, sub)?,
        Some(("rm", sub)) => {
            let id = required_id(sub)?;
            SqliteStore::new(conn).delete_budget(id)?;
            println!("Removed budget #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = parse_period(required(sub, "month")?)?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let currency = parse_currency(required(sub, "currency")?)?;
    let store = SqliteStore::new(conn);
    let b = store.set_budget(required(sub, "category")?, amount, currency, period)?;
    println!(
        "Budget set for {} / {} = {}",
        period,
        b.category,
        fmt_money(b.amount, b.currency)
    );

    let settings = Settings::load(conn)?;
    let raised = evaluate(&store, period, &settings.alert_policy())
        .with_context(|| format!("Alert evaluation for {} failed", period))?;
    super::alerts::print_raised(&raised);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = sub
        .get_one::<String>("month")
        .map(|s| parse_period(s))
        .transpose()?;
    let budgets = SqliteStore::new(conn).list_budgets(period)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &budgets)? {
        let data = budgets
            .iter()
            .map(|b| {
                vec![
                    b.id.to_string(),
                    b.period().to_string(),
                    b.category.clone(),
                    fmt_money(b.amount, b.currency),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["ID", "Month", "Category", "Budget"], data)
        );
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct ReportRow {
    pub category: String,
    pub currency: Currency,
    pub budget: String,
    pub spent: String,
    pub remaining: String,
    pub percentage: String,
}

/// Budget versus spend for one month, amounts in the requested or configured
/// display currency.
pub fn report_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<ReportRow>> {
    let period = parse_period(required(sub, "month")?)?;
    let out_ccy = match sub.get_one::<String>("currency") {
        Some(c) => parse_currency(c)?,
        None => Settings::load(conn)?.display_currency,
    };
    let base = Currency::base();
    let store = SqliteStore::new(conn);
    let budgets = store.budgets_for_period(period)?;
    let transactions = store.transactions(Some(period))?;
    let dp = out_ccy.decimal_places();
    Ok(summarize(&budgets, &transactions, period)?
        .into_iter()
        .map(|s| ReportRow {
            category: s.category,
            currency: out_ccy,
            budget: convert(s.limit, base, out_ccy).round_dp(dp).to_string(),
            spent: convert(s.spent, base, out_ccy).round_dp(dp).to_string(),
            remaining: convert(s.limit.saturating_sub(s.spent), base, out_ccy)
                .round_dp(dp)
                .to_string(),
            percentage: format!("{:.2}", s.percentage.round_dp(2)),
        })
        .collect())
}

fn report(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let rows = report_rows(conn, sub)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &rows)? {
        let data = rows
            .into_iter()
            .map(|r| {
                vec![
                    r.category,
                    format!("{} {}", r.budget, r.currency),
                    format!("{} {}", r.spent, r.currency),
                    format!("{} {}", r.remaining, r.currency),
                    format!("{}%", r.percentage),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Budget", "Spent", "Remaining", "Used"], data)
        );
    }
    Ok(())
}

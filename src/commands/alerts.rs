// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::alerts::evaluate;
use crate::config::Settings;
use crate::currency::fmt_money;
use crate::models::BudgetAlert;
use crate::store::{AlertStore, SqliteStore};
use crate::utils::{maybe_print_json, parse_period, pretty_table, required, required_id};
use anyhow::Result;
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("check", sub)) => check(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("read", sub)) => read(conn, sub)?,
        Some(("rm", sub)) => {
            let id = required_id(sub)?;
            SqliteStore::new(conn).delete_alert(id)?;
            println!("Removed alert #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn check(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = parse_period(required(sub, "month")?)?;
    let settings = Settings::load(conn)?;
    let raised = evaluate(&SqliteStore::new(conn), period, &settings.alert_policy())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &raised)? {
        if raised.is_empty() {
            println!(
                "No budget for {} has reached {}%",
                period, settings.alert_threshold
            );
        } else {
            println!("{}", alert_table(&raised));
        }
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let period = sub
        .get_one::<String>("month")
        .map(|s| parse_period(s))
        .transpose()?;
    let alerts = SqliteStore::new(conn).list_alerts(sub.get_flag("unread"), period)?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &alerts)? {
        println!("{}", alert_table(&alerts));
    }
    Ok(())
}

fn read(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let store = SqliteStore::new(conn);
    if sub.get_flag("all") {
        let period = sub
            .get_one::<String>("month")
            .map(|s| parse_period(s))
            .transpose()?;
        let n = store.mark_all_read(period)?;
        println!("Marked {} alert(s) as read", n);
    } else {
        let id = required_id(sub)?;
        store.mark_alert_read(id)?;
        println!("Marked alert #{} as read", id);
    }
    Ok(())
}

fn alert_table(alerts: &[BudgetAlert]) -> comfy_table::Table {
    let rows = alerts
        .iter()
        .map(|a| {
            vec![
                a.id.to_string(),
                format!("{:04}-{:02}", a.year, a.month),
                a.category.clone(),
                fmt_money(a.budget_amount, a.currency),
                fmt_money(a.spent_amount, a.currency),
                format!("{:.2}%", a.percentage.round_dp(2)),
                if a.is_read { "read" } else { "unread" }.to_string(),
                a.created_at.format("%Y-%m-%d %H:%M").to_string(),
            ]
        })
        .collect();
    pretty_table(
        &["ID", "Month", "Category", "Budget", "Spent", "Used", "Status", "Raised"],
        rows,
    )
}

/// Shown after writes that re-run the evaluator.
pub fn print_raised(raised: &[BudgetAlert]) {
    for a in raised {
        println!(
            "ALERT {} {:04}-{:02}: {} of {} spent ({:.2}%)",
            a.category,
            a.year,
            a.month,
            fmt_money(a.spent_amount, a.currency),
            fmt_money(a.budget_amount, a.currency),
            a.percentage.round_dp(2)
        );
    }
}

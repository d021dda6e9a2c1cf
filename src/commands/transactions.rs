// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::alerts::evaluate;
use crate::config::Settings;
use crate::currency::fmt_money;
use crate::models::{NewTransaction, Period, Transaction, TransactionKind};
use crate::store::SqliteStore;
use crate::utils::{
    maybe_print_json, parse_currency, parse_date, parse_decimal, parse_period, pretty_table,
    required, required_id,
};
use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("rm", sub)) => {
            let id = required_id(sub)?;
            SqliteStore::new(conn).delete_transaction(id)?;
            println!("Removed transaction #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let kind: TransactionKind = required(sub, "type")?.parse()?;
    let tx = NewTransaction {
        kind,
        category: required(sub, "category")?.to_string(),
        amount: parse_decimal(required(sub, "amount")?)?,
        currency: parse_currency(required(sub, "currency")?)?,
        occurred_on: parse_date(required(sub, "date")?)?,
        income_source: sub
            .get_one::<String>("source")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    };
    let store = SqliteStore::new(conn);
    let id = store.add_transaction(&tx)?;
    println!(
        "Recorded {} #{}: {} in '{}' on {}",
        kind.as_str(),
        id,
        fmt_money(tx.amount, tx.currency),
        tx.category.trim(),
        tx.occurred_on
    );

    if kind == TransactionKind::Expense {
        let period = Period::of(tx.occurred_on);
        let settings = Settings::load(conn)?;
        let raised = evaluate(&store, period, &settings.alert_policy())
            .with_context(|| format!("Alert evaluation for {} failed", period))?;
        super::alerts::print_raised(&raised);
    }
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let json_flag = sub.get_flag("json");
    let jsonl_flag = sub.get_flag("jsonl");
    let data = query_rows(conn, sub)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data
            .iter()
            .map(|t| {
                vec![
                    t.id.to_string(),
                    t.occurred_on.to_string(),
                    t.kind.as_str().to_string(),
                    t.category.clone(),
                    fmt_money(t.amount, t.currency),
                    t.income_source.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Date", "Type", "Category", "Amount", "Source"],
                rows
            )
        );
    }
    Ok(())
}

pub fn query_rows(conn: &Connection, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let period = sub
        .get_one::<String>("month")
        .map(|s| parse_period(s))
        .transpose()?;
    let category = sub.get_one::<String>("category").map(|s| s.as_str());
    let limit = sub.get_one::<usize>("limit").copied();
    Ok(SqliteStore::new(conn).list_transactions(period, category, limit)?)
}

// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::store::SqliteStore;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::Connection;

pub fn issues(conn: &Connection) -> Result<Vec<Vec<String>>> {
    let mut rows = Vec::new();

    // 1) Currency codes outside the supported set
    for (table, code) in SqliteStore::new(conn).unsupported_currencies()? {
        rows.push(vec!["unsupported_currency".into(), format!("{} {}", table, code)]);
    }

    // 2) Budgets that can never raise an alert
    let mut stmt = conn.prepare(
        "SELECT category, month, year, amount FROM budgets ORDER BY year, month, category",
    )?;
    let mut cur = stmt.query([])?;
    while let Some(r) = cur.next()? {
        let category: String = r.get(0)?;
        let month: u32 = r.get(1)?;
        let year: i32 = r.get(2)?;
        let amount: String = r.get(3)?;
        let zero = amount
            .parse::<rust_decimal::Decimal>()
            .map(|d| d.is_zero())
            .unwrap_or(false);
        if zero {
            rows.push(vec![
                "zero_budget".into(),
                format!("{:04}-{:02} {}", year, month, category),
            ]);
        }
    }

    // 3) Unread alerts whose budget was deleted
    let mut stmt2 = conn.prepare(
        "SELECT id, category FROM budget_alerts WHERE budget_id IS NULL AND is_read=0 ORDER BY id",
    )?;
    let mut cur2 = stmt2.query([])?;
    while let Some(r) = cur2.next()? {
        let id: i64 = r.get(0)?;
        let category: String = r.get(1)?;
        rows.push(vec!["orphan_alert".into(), format!("#{} {}", id, category)]);
    }

    Ok(rows)
}

pub fn handle(conn: &Connection) -> Result<()> {
    let rows = issues(conn)?;
    if rows.is_empty() {
        println!("doctor: no issues found");
    } else {
        println!("{}", pretty_table(&["Issue", "Detail"], rows));
    }
    Ok(())
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Persistence for budgets, transactions and alerts.

use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

use crate::currency::Currency;
use crate::errors::{Error, Result};
use crate::models::{
    AlertDraft, Budget, BudgetAlert, NewTransaction, Period, Transaction, TransactionKind,
};

/// What the alert evaluator needs from storage.
pub trait AlertStore {
    fn budgets_for_period(&self, period: Period) -> Result<Vec<Budget>>;

    /// All transactions, or only those dated within `period` when given.
    fn transactions(&self, period: Option<Period>) -> Result<Vec<Transaction>>;

    fn find_alert(&self, category: &str, period: Period, is_read: bool)
    -> Result<Option<BudgetAlert>>;

    /// Inserts an unread alert, or refreshes the existing unread alert for
    /// the same category and period.
    fn upsert_unread_alert(&self, draft: &AlertDraft) -> Result<BudgetAlert>;

    fn mark_alert_read(&self, id: i64) -> Result<()>;

    fn mark_all_read(&self, period: Option<Period>) -> Result<usize>;

    fn delete_alert(&self, id: i64) -> Result<()>;

    fn list_alerts(&self, unread_only: bool, period: Option<Period>) -> Result<Vec<BudgetAlert>>;
}

pub struct SqliteStore<'a> {
    conn: &'a Connection,
}

const ALERT_COLUMNS: &str = "id, budget_id, category, budget_amount, spent_amount, currency, month, year, percentage, is_read, created_at";

fn conversion_err<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn decimal_at(r: &Row, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = r.get(idx)?;
    s.parse::<Decimal>().map_err(|e| conversion_err(idx, e))
}

fn currency_at(r: &Row, idx: usize) -> rusqlite::Result<Currency> {
    let s: String = r.get(idx)?;
    s.parse::<Currency>().map_err(|e| conversion_err(idx, e))
}

fn alert_from_row(r: &Row) -> rusqlite::Result<BudgetAlert> {
    Ok(BudgetAlert {
        id: r.get(0)?,
        budget_id: r.get(1)?,
        category: r.get(2)?,
        budget_amount: decimal_at(r, 3)?,
        spent_amount: decimal_at(r, 4)?,
        currency: currency_at(r, 5)?,
        month: r.get(6)?,
        year: r.get(7)?,
        percentage: decimal_at(r, 8)?,
        is_read: r.get(9)?,
        created_at: r.get(10)?,
    })
}

fn budget_from_row(r: &Row) -> rusqlite::Result<Budget> {
    Ok(Budget {
        id: r.get(0)?,
        category: r.get(1)?,
        amount: decimal_at(r, 2)?,
        currency: currency_at(r, 3)?,
        month: r.get(4)?,
        year: r.get(5)?,
    })
}

fn transaction_from_row(r: &Row) -> rusqlite::Result<Transaction> {
    let kind: String = r.get(1)?;
    Ok(Transaction {
        id: r.get(0)?,
        kind: kind.parse::<TransactionKind>().map_err(|e| conversion_err(1, e))?,
        category: r.get(2)?,
        amount: decimal_at(r, 3)?,
        currency: currency_at(r, 4)?,
        occurred_on: r.get(5)?,
        income_source: r.get(6)?,
    })
}

fn clean_category(category: &str) -> Result<String> {
    let c = category.trim();
    if c.is_empty() {
        return Err(Error::Validation("category must not be empty".into()));
    }
    Ok(c.to_string())
}

impl<'a> SqliteStore<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        SqliteStore { conn }
    }

    pub fn add_transaction(&self, tx: &NewTransaction) -> Result<i64> {
        let category = clean_category(&tx.category)?;
        self.conn.execute(
            "INSERT INTO transactions(type, category, amount, currency, date, income_source)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                tx.kind.as_str(),
                category,
                tx.amount.to_string(),
                tx.currency.code(),
                tx.occurred_on,
                tx.income_source
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn transaction(&self, id: i64) -> Result<Transaction> {
        self.conn
            .query_row(
                "SELECT id, type, category, amount, currency, date, income_source
                 FROM transactions WHERE id=?1",
                params![id],
                transaction_from_row,
            )
            .optional()?
            .ok_or_else(|| Error::NotFound(format!("Transaction {}", id)))
    }

    pub fn delete_transaction(&self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM transactions WHERE id=?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Transaction {}", id)));
        }
        Ok(())
    }

    pub fn list_transactions(
        &self,
        period: Option<Period>,
        category: Option<&str>,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        let mut sql = String::from(
            "SELECT id, type, category, amount, currency, date, income_source FROM transactions WHERE 1=1",
        );
        let mut params_vec: Vec<String> = Vec::new();
        if let Some(p) = period {
            sql.push_str(" AND substr(date,1,7)=?");
            params_vec.push(p.to_string());
        }
        if let Some(c) = category {
            sql.push_str(" AND category=?");
            params_vec.push(c.trim().to_string());
        }
        sql.push_str(" ORDER BY date DESC, id DESC");
        if let Some(l) = limit {
            sql.push_str(&format!(" LIMIT {}", l));
        }
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), transaction_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Creates or overwrites the budget for `(category, period)`.
    pub fn set_budget(
        &self,
        category: &str,
        amount: Decimal,
        currency: Currency,
        period: Period,
    ) -> Result<Budget> {
        let category = clean_category(category)?;
        if amount < Decimal::ZERO {
            return Err(Error::Validation(format!(
                "budget amount must not be negative, got {}",
                amount
            )));
        }
        let b = self.conn.query_row(
            "INSERT INTO budgets(category, amount, currency, month, year) VALUES (?1,?2,?3,?4,?5)
             ON CONFLICT(category, month, year) DO UPDATE SET amount=excluded.amount, currency=excluded.currency
             RETURNING id, category, amount, currency, month, year",
            params![
                category,
                amount.to_string(),
                currency.code(),
                period.month,
                period.year
            ],
            budget_from_row,
        )?;
        Ok(b)
    }

    pub fn delete_budget(&self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM budgets WHERE id=?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Budget {}", id)));
        }
        Ok(())
    }

    pub fn list_budgets(&self, period: Option<Period>) -> Result<Vec<Budget>> {
        match period {
            Some(p) => self.budgets_for_period(p),
            None => {
                let mut stmt = self.conn.prepare(
                    "SELECT id, category, amount, currency, month, year FROM budgets
                     ORDER BY year DESC, month DESC, category",
                )?;
                let rows = stmt.query_map([], budget_from_row)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row?);
                }
                Ok(out)
            }
        }
    }

    /// Distinct currency codes stored anywhere that fall outside the supported set.
    pub fn unsupported_currencies(&self) -> Result<Vec<(String, String)>> {
        let mut out = Vec::new();
        for (table, sql) in [
            ("transactions", "SELECT DISTINCT currency FROM transactions"),
            ("budgets", "SELECT DISTINCT currency FROM budgets"),
            ("budget_alerts", "SELECT DISTINCT currency FROM budget_alerts"),
        ] {
            let mut stmt = self.conn.prepare(sql)?;
            let rows = stmt.query_map([], |r| r.get::<_, String>(0))?;
            for row in rows {
                let code = row?;
                if code.parse::<Currency>().is_err() {
                    out.push((table.to_string(), code));
                }
            }
        }
        Ok(out)
    }
}

impl AlertStore for SqliteStore<'_> {
    fn budgets_for_period(&self, period: Period) -> Result<Vec<Budget>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, category, amount, currency, month, year FROM budgets
             WHERE month=?1 AND year=?2 ORDER BY category",
        )?;
        let rows = stmt.query_map(params![period.month, period.year], budget_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn transactions(&self, period: Option<Period>) -> Result<Vec<Transaction>> {
        self.list_transactions(period, None, None)
    }

    fn find_alert(
        &self,
        category: &str,
        period: Period,
        is_read: bool,
    ) -> Result<Option<BudgetAlert>> {
        let sql = format!(
            "SELECT {} FROM budget_alerts WHERE category=?1 AND month=?2 AND year=?3 AND is_read=?4
             ORDER BY id DESC LIMIT 1",
            ALERT_COLUMNS
        );
        let a = self
            .conn
            .query_row(
                &sql,
                params![category, period.month, period.year, is_read],
                alert_from_row,
            )
            .optional()?;
        Ok(a)
    }

    fn upsert_unread_alert(&self, draft: &AlertDraft) -> Result<BudgetAlert> {
        let sql = format!(
            "INSERT INTO budget_alerts(budget_id, category, budget_amount, spent_amount, currency, month, year, percentage, is_read, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0, ?9)
             ON CONFLICT(category, month, year) WHERE is_read = 0 DO UPDATE SET
                budget_id=excluded.budget_id,
                budget_amount=excluded.budget_amount,
                spent_amount=excluded.spent_amount,
                percentage=excluded.percentage,
                created_at=excluded.created_at
             RETURNING {}",
            ALERT_COLUMNS
        );
        let a = self.conn.query_row(
            &sql,
            params![
                draft.budget_id,
                draft.category,
                draft.budget_amount.to_string(),
                draft.spent_amount.to_string(),
                Currency::base().code(),
                draft.period.month,
                draft.period.year,
                draft.percentage.to_string(),
                draft.created_at
            ],
            alert_from_row,
        )?;
        Ok(a)
    }

    fn mark_alert_read(&self, id: i64) -> Result<()> {
        let n = self.conn.execute(
            "UPDATE budget_alerts SET is_read=1 WHERE id=?1",
            params![id],
        )?;
        if n == 0 {
            return Err(Error::NotFound(format!("Alert {}", id)));
        }
        Ok(())
    }

    fn mark_all_read(&self, period: Option<Period>) -> Result<usize> {
        let n = match period {
            Some(p) => self.conn.execute(
                "UPDATE budget_alerts SET is_read=1 WHERE is_read=0 AND month=?1 AND year=?2",
                params![p.month, p.year],
            )?,
            None => self
                .conn
                .execute("UPDATE budget_alerts SET is_read=1 WHERE is_read=0", [])?,
        };
        Ok(n)
    }

    fn delete_alert(&self, id: i64) -> Result<()> {
        let n = self
            .conn
            .execute("DELETE FROM budget_alerts WHERE id=?1", params![id])?;
        if n == 0 {
            return Err(Error::NotFound(format!("Alert {}", id)));
        }
        Ok(())
    }

    fn list_alerts(&self, unread_only: bool, period: Option<Period>) -> Result<Vec<BudgetAlert>> {
        let mut sql = format!("SELECT {} FROM budget_alerts WHERE 1=1", ALERT_COLUMNS);
        let mut params_vec: Vec<i64> = Vec::new();
        if unread_only {
            sql.push_str(" AND is_read=0");
        }
        if let Some(p) = period {
            sql.push_str(" AND month=? AND year=?");
            params_vec.push(p.month as i64);
            params_vec.push(p.year as i64);
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(params_vec.iter()), alert_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }
}

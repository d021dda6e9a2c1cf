// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::currency::Currency;
use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Income => "income",
            TransactionKind::Expense => "expense",
        }
    }
}

impl FromStr for TransactionKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" => Ok(TransactionKind::Income),
            "expense" => Ok(TransactionKind::Expense),
            other => Err(Error::Validation(format!(
                "unknown transaction type '{}', expected income or expense",
                other
            ))),
        }
    }
}

/// A budgeting cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> Result<Self, Error> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidPeriod(format!("{:04}-{:02}", year, month)));
        }
        Ok(Period { year, month })
    }

    pub fn of(date: NaiveDate) -> Self {
        Period {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let date = NaiveDate::parse_from_str(&format!("{}-01", s), "%Y-%m-%d")
            .map_err(|_| Error::InvalidPeriod(s.to_string()))?;
        Ok(Period::of(date))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub occurred_on: NaiveDate,
    pub income_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub category: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub occurred_on: NaiveDate,
    pub income_source: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub category: String,
    pub amount: Decimal,
    pub currency: Currency,
    pub month: u32,
    pub year: i32,
}

impl Budget {
    pub fn period(&self) -> Period {
        Period {
            year: self.year,
            month: self.month,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub id: i64,
    pub budget_id: Option<i64>,
    pub category: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub currency: Currency,
    pub month: u32,
    pub year: i32,
    pub percentage: Decimal,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Values written by the evaluator when a budget crosses its threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertDraft {
    pub budget_id: i64,
    pub category: String,
    pub budget_amount: Decimal,
    pub spent_amount: Decimal,
    pub period: Period,
    pub percentage: Decimal,
    pub created_at: DateTime<Utc>,
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Budget alert evaluation.
//!
//! For one period, expense spend is summed per category in the base currency
//! and compared with each budget. A budget spent to at least the threshold
//! produces an unread alert, or refreshes the unread alert already stored for
//! that category and period. Alerts are never cleared here when spend falls
//! back below the threshold.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::currency::checked_to_base;
use crate::errors::{Error, Result};
use crate::models::{AlertDraft, Budget, BudgetAlert, Period, Transaction, TransactionKind};
use crate::store::AlertStore;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlertPolicy {
    /// Inclusive percentage of the limit at which an alert is raised.
    pub threshold: Decimal,
    /// Raise a fresh alert when the only alert for the key was already read.
    pub renotify_after_read: bool,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        AlertPolicy {
            threshold: Decimal::from(80),
            renotify_after_read: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BudgetStatus {
    pub budget_id: i64,
    pub category: String,
    pub limit: Decimal,
    pub spent: Decimal,
    pub percentage: Decimal,
}

/// Expense totals per category for `period`, in the base currency.
///
/// Fails with `Validation` when a total leaves the decimal range.
pub fn spend_by_category(
    transactions: &[Transaction],
    period: Period,
) -> Result<BTreeMap<String, Decimal>> {
    let mut totals: BTreeMap<String, Decimal> = BTreeMap::new();
    for t in transactions
        .iter()
        .filter(|t| t.kind == TransactionKind::Expense && period.contains(t.occurred_on))
    {
        let amount = checked_to_base(t.amount.abs(), t.currency)?;
        let total = totals.entry(t.category.clone()).or_default();
        *total = total.checked_add(amount).ok_or_else(|| {
            Error::Validation(format!("spend for '{}' in {} is out of range", t.category, period))
        })?;
    }
    Ok(totals)
}

/// `spent / limit * 100`, or zero when the limit is not positive.
/// Saturates at `Decimal::MAX` when the ratio is too large to represent.
pub fn percentage_used(spent: Decimal, limit: Decimal) -> Decimal {
    if limit <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    spent
        .checked_div(limit)
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::MAX)
}

/// Budget-versus-spend for every budget of `period`.
pub fn summarize(
    budgets: &[Budget],
    transactions: &[Transaction],
    period: Period,
) -> Result<Vec<BudgetStatus>> {
    let totals = spend_by_category(transactions, period)?;
    let mut out = Vec::new();
    for b in budgets.iter().filter(|b| b.period() == period) {
        let spent = totals.get(&b.category).copied().unwrap_or(Decimal::ZERO);
        let limit = checked_to_base(b.amount, b.currency)?;
        out.push(BudgetStatus {
            budget_id: b.id,
            category: b.category.clone(),
            limit,
            spent,
            percentage: percentage_used(spent, limit),
        });
    }
    Ok(out)
}

pub fn evaluate<S: AlertStore>(store: &S, period: Period, policy: &AlertPolicy) -> Result<Vec<BudgetAlert>> {
    evaluate_at(store, period, policy, Utc::now())
}

/// Runs one evaluation pass and returns the alerts created or refreshed.
///
/// Each upsert commits on its own; an error stops the pass and leaves earlier
/// upserts in place.
pub fn evaluate_at<S: AlertStore>(
    store: &S,
    period: Period,
    policy: &AlertPolicy,
    now: DateTime<Utc>,
) -> Result<Vec<BudgetAlert>> {
    let budgets = store.budgets_for_period(period)?;
    let transactions = store.transactions(Some(period))?;

    let mut raised = Vec::new();
    for status in summarize(&budgets, &transactions, period)? {
        debug!(
            "{} {}: spent {} of {} ({}%)",
            period,
            status.category,
            status.spent,
            status.limit,
            status.percentage.round_dp(2)
        );
        if status.percentage < policy.threshold {
            continue;
        }

        let unread = store.find_alert(&status.category, period, false)?;
        if unread.is_none()
            && !policy.renotify_after_read
            && store.find_alert(&status.category, period, true)?.is_some()
        {
            warn!(
                "{} {} is at {}% but its alert was already read; not raising again",
                period,
                status.category,
                status.percentage.round_dp(2)
            );
            continue;
        }

        let alert = store.upsert_unread_alert(&AlertDraft {
            budget_id: status.budget_id,
            category: status.category.clone(),
            budget_amount: status.limit,
            spent_amount: status.spent,
            period,
            percentage: status.percentage,
            created_at: now,
        })?;
        info!(
            "{} alert #{} for {} {}: {}%",
            if unread.is_some() { "refreshed" } else { "raised" },
            alert.id,
            alert.category,
            period,
            alert.percentage.round_dp(2)
        );
        raised.push(alert);
    }
    Ok(raised)
}

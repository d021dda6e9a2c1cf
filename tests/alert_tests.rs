// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::cell::Cell;

use budgetwatch::alerts::{AlertPolicy, evaluate_at, percentage_used, spend_by_category};
use budgetwatch::currency::Currency;
use budgetwatch::errors::{Error, Result};
use budgetwatch::models::{
    AlertDraft, Budget, BudgetAlert, NewTransaction, Period, Transaction, TransactionKind,
};
use budgetwatch::store::{AlertStore, SqliteStore};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    budgetwatch::db::init_schema(&conn).unwrap();
    conn
}

fn june() -> Period {
    Period::new(6, 2024).unwrap()
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn record(
    store: &SqliteStore,
    kind: TransactionKind,
    category: &str,
    amount: Decimal,
    currency: Currency,
    date: (i32, u32, u32),
) -> i64 {
    store
        .add_transaction(&NewTransaction {
            kind,
            category: category.into(),
            amount,
            currency,
            occurred_on: NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            income_source: None,
        })
        .unwrap()
}

fn spend(store: &SqliteStore, category: &str, amount: Decimal, day: u32) -> i64 {
    record(
        store,
        TransactionKind::Expense,
        category,
        amount,
        Currency::Xof,
        (2024, 6, day),
    )
}

#[test]
fn threshold_is_inclusive() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loyer", dec!(500), 3);
    spend(&store, "Loyer", dec!(300), 4);

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(5, 9)).unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].percentage, dec!(80));
    assert!(!raised[0].is_read);
}

#[test]
fn just_below_threshold_raises_nothing() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loyer", dec!(799.999), 3);

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(5, 9)).unwrap();
    assert!(raised.is_empty());
    assert!(store.list_alerts(false, None).unwrap().is_empty());
    assert!(percentage_used(dec!(799.999), dec!(1000)) < dec!(80));
}

#[test]
fn nourriture_end_to_end() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let budget = store
        .set_budget("Nourriture", dec!(100000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Nourriture", dec!(30000), 2);
    spend(&store, "Nourriture", dec!(25000), 14);
    spend(&store, "Nourriture", dec!(30000), 28);
    // Not counted: income, another month, another category.
    record(
        &store,
        TransactionKind::Income,
        "Nourriture",
        dec!(50000),
        Currency::Xof,
        (2024, 6, 10),
    );
    record(
        &store,
        TransactionKind::Expense,
        "Nourriture",
        dec!(90000),
        Currency::Xof,
        (2024, 7, 1),
    );
    spend(&store, "Transport", dec!(90000), 5);

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(30, 18)).unwrap();
    assert_eq!(raised.len(), 1);
    let a = &raised[0];
    assert_eq!(a.category, "Nourriture");
    assert_eq!(a.budget_id, Some(budget.id));
    assert_eq!(a.budget_amount, dec!(100000));
    assert_eq!(a.spent_amount, dec!(85000));
    assert_eq!(a.percentage, dec!(85));
    assert_eq!(a.currency, Currency::Xof);
    assert_eq!((a.month, a.year), (6, 2024));
    assert!(!a.is_read);
    assert_eq!(a.created_at, at(30, 18));
}

#[test]
fn foreign_budget_is_normalized_to_base() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Cadeaux", dec!(1), Currency::Eur, june())
        .unwrap();
    spend(&store, "Cadeaux", dec!(600), 12);

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(12, 20)).unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].budget_amount, dec!(660));
    assert_eq!(raised[0].percentage.round_dp(2), dec!(90.91));
}

#[test]
fn foreign_spend_is_normalized_to_base() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Voyage", dec!(100000), Currency::Xof, june())
        .unwrap();
    record(
        &store,
        TransactionKind::Expense,
        "Voyage",
        dec!(150),
        Currency::Eur,
        (2024, 6, 20),
    );

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(21, 8)).unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].spent_amount, dec!(99000));
    assert_eq!(raised[0].percentage, dec!(99));
}

#[test]
fn re_evaluation_refreshes_single_unread_alert() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Nourriture", dec!(100000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Nourriture", dec!(85000), 10);

    let first = evaluate_at(&store, june(), &AlertPolicy::default(), at(10, 12)).unwrap();
    let again = evaluate_at(&store, june(), &AlertPolicy::default(), at(10, 13)).unwrap();
    assert_eq!(first[0].id, again[0].id);
    assert_eq!(store.list_alerts(false, Some(june())).unwrap().len(), 1);

    spend(&store, "Nourriture", dec!(10000), 11);
    let later = evaluate_at(&store, june(), &AlertPolicy::default(), at(11, 9)).unwrap();
    assert_eq!(later[0].id, first[0].id);

    let stored = store.list_alerts(false, Some(june())).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].spent_amount, dec!(95000));
    assert_eq!(stored[0].percentage, dec!(95));
    assert_eq!(stored[0].created_at, at(11, 9));
}

#[test]
fn read_alert_does_not_reappear() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Loisirs", dec!(20000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loisirs", dec!(17000), 6);

    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(6, 10)).unwrap();
    store.mark_alert_read(raised[0].id).unwrap();

    spend(&store, "Loisirs", dec!(13000), 7);
    let again = evaluate_at(&store, june(), &AlertPolicy::default(), at(7, 10)).unwrap();
    assert!(again.is_empty());

    let stored = store.list_alerts(false, Some(june())).unwrap();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].is_read);
    assert_eq!(stored[0].spent_amount, dec!(17000));
    assert!(store.list_alerts(true, None).unwrap().is_empty());
}

#[test]
fn renotify_policy_raises_beside_read_alert() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Loisirs", dec!(20000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loisirs", dec!(17000), 6);
    let policy = AlertPolicy {
        renotify_after_read: true,
        ..AlertPolicy::default()
    };

    let raised = evaluate_at(&store, june(), &policy, at(6, 10)).unwrap();
    store.mark_alert_read(raised[0].id).unwrap();
    spend(&store, "Loisirs", dec!(13000), 7);
    let again = evaluate_at(&store, june(), &policy, at(7, 10)).unwrap();

    assert_eq!(again.len(), 1);
    assert_ne!(again[0].id, raised[0].id);
    assert_eq!(again[0].percentage, dec!(150));
    assert_eq!(store.list_alerts(false, Some(june())).unwrap().len(), 2);
    assert_eq!(store.list_alerts(true, Some(june())).unwrap().len(), 1);
}

#[test]
fn zero_limit_never_alerts() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Divers", Decimal::ZERO, Currency::Xof, june())
        .unwrap();
    spend(&store, "Divers", dec!(5000), 9);

    assert_eq!(percentage_used(dec!(5000), Decimal::ZERO), Decimal::ZERO);
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(9, 9)).unwrap();
    assert!(raised.is_empty());
}

#[test]
fn dropping_below_threshold_keeps_existing_alert() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Sante", dec!(10000), Currency::Xof, june())
        .unwrap();
    let big = spend(&store, "Sante", dec!(9000), 2);
    spend(&store, "Sante", dec!(500), 3);
    evaluate_at(&store, june(), &AlertPolicy::default(), at(3, 9)).unwrap();

    store.delete_transaction(big).unwrap();
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(4, 9)).unwrap();
    assert!(raised.is_empty());
    let stored = store.list_alerts(true, Some(june())).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].spent_amount, dec!(9500));
}

#[test]
fn custom_threshold_applies() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Nourriture", dec!(100000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Nourriture", dec!(85000), 10);
    let policy = AlertPolicy {
        threshold: dec!(90),
        ..AlertPolicy::default()
    };
    assert!(evaluate_at(&store, june(), &policy, at(10, 9)).unwrap().is_empty());
}

#[test]
fn deleting_budget_keeps_alert_without_link() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let b = store
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loyer", dec!(900), 1);
    evaluate_at(&store, june(), &AlertPolicy::default(), at(1, 9)).unwrap();

    store.delete_budget(b.id).unwrap();
    let stored = store.list_alerts(false, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].budget_id, None);
}

#[test]
fn re_created_budget_relinks_unread_alert() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let old = store
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    spend(&store, "Loyer", dec!(900), 1);
    evaluate_at(&store, june(), &AlertPolicy::default(), at(1, 9)).unwrap();

    store.delete_budget(old.id).unwrap();
    let new = store
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(2, 9)).unwrap();

    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].budget_id, Some(new.id));
    let stored = store.list_alerts(false, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].budget_id, Some(new.id));
}

#[test]
fn tiny_limit_saturates_percentage() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    let tiny = Decimal::new(1, 18);
    let huge = Decimal::new(1_000_000_000_000, 0);
    assert_eq!(percentage_used(huge, tiny), Decimal::MAX);

    store.set_budget("X", tiny, Currency::Xof, june()).unwrap();
    spend(&store, "X", huge, 15);
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(15, 9)).unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].percentage, Decimal::MAX);
    assert_eq!(raised[0].spent_amount, huge);
}

#[test]
fn out_of_range_spend_is_rejected() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("Yacht", dec!(1000), Currency::Xof, june())
        .unwrap();
    // 1e27 EUR is beyond the decimal range once converted to XOF.
    let big = Decimal::from_i128_with_scale(10i128.pow(27), 0);
    record(
        &store,
        TransactionKind::Expense,
        "Yacht",
        big,
        Currency::Eur,
        (2024, 6, 3),
    );

    let res = evaluate_at(&store, june(), &AlertPolicy::default(), at(3, 9));
    assert!(matches!(res, Err(Error::Validation(_))));

    let totals = spend_by_category(
        &[
            Transaction {
                id: 1,
                kind: TransactionKind::Expense,
                category: "A".into(),
                amount: Decimal::MAX,
                currency: Currency::Xof,
                occurred_on: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
                income_source: None,
            },
            Transaction {
                id: 2,
                kind: TransactionKind::Expense,
                category: "A".into(),
                amount: Decimal::ONE,
                currency: Currency::Xof,
                occurred_on: NaiveDate::from_ymd_opt(2024, 6, 2).unwrap(),
                income_source: None,
            },
        ],
        june(),
    );
    assert!(matches!(totals, Err(Error::Validation(_))));
}

#[test]
fn mark_all_read_and_delete() {
    let conn = setup();
    let store = SqliteStore::new(&conn);
    store
        .set_budget("A", dec!(100), Currency::Xof, june())
        .unwrap();
    store
        .set_budget("B", dec!(100), Currency::Xof, june())
        .unwrap();
    spend(&store, "A", dec!(90), 1);
    spend(&store, "B", dec!(95), 1);
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(1, 9)).unwrap();
    assert_eq!(raised.len(), 2);

    assert_eq!(store.mark_all_read(Some(june())).unwrap(), 2);
    assert!(store.list_alerts(true, None).unwrap().is_empty());

    store.delete_alert(raised[0].id).unwrap();
    assert_eq!(store.list_alerts(false, None).unwrap().len(), 1);
    assert!(matches!(
        store.delete_alert(raised[0].id),
        Err(Error::NotFound(_))
    ));
    assert!(matches!(store.mark_alert_read(9999), Err(Error::NotFound(_))));
}

#[test]
fn spend_aggregation_filters_kind_and_period() {
    let tx = |id, kind, category: &str, amount, currency, m, d| Transaction {
        id,
        kind,
        category: category.into(),
        amount,
        currency,
        occurred_on: NaiveDate::from_ymd_opt(2024, m, d).unwrap(),
        income_source: None,
    };
    let txs = vec![
        tx(1, TransactionKind::Expense, "A", dec!(100), Currency::Xof, 6, 1),
        tx(2, TransactionKind::Expense, "A", dec!(1), Currency::Eur, 6, 30),
        tx(3, TransactionKind::Income, "A", dec!(999), Currency::Xof, 6, 15),
        tx(4, TransactionKind::Expense, "A", dec!(999), Currency::Xof, 5, 31),
        tx(5, TransactionKind::Expense, "B", dec!(5), Currency::Xof, 6, 2),
    ];
    let totals = spend_by_category(&txs, june()).unwrap();
    assert_eq!(totals.len(), 2);
    assert_eq!(totals["A"], dec!(760));
    assert_eq!(totals["B"], dec!(5));
}

/// Wraps the SQLite store to return unfiltered transactions and to fail on a
/// chosen upsert.
struct FlakyStore<'a> {
    inner: SqliteStore<'a>,
    upserts: Cell<usize>,
    fail_on: usize,
}

impl AlertStore for FlakyStore<'_> {
    fn budgets_for_period(&self, period: Period) -> Result<Vec<Budget>> {
        self.inner.budgets_for_period(period)
    }

    fn transactions(&self, _period: Option<Period>) -> Result<Vec<Transaction>> {
        self.inner.transactions(None)
    }

    fn find_alert(
        &self,
        category: &str,
        period: Period,
        is_read: bool,
    ) -> Result<Option<BudgetAlert>> {
        self.inner.find_alert(category, period, is_read)
    }

    fn upsert_unread_alert(&self, draft: &AlertDraft) -> Result<BudgetAlert> {
        let n = self.upserts.get() + 1;
        self.upserts.set(n);
        if n == self.fail_on {
            return Err(Error::Persistence(rusqlite::Error::QueryReturnedNoRows));
        }
        self.inner.upsert_unread_alert(draft)
    }

    fn mark_alert_read(&self, id: i64) -> Result<()> {
        self.inner.mark_alert_read(id)
    }

    fn mark_all_read(&self, period: Option<Period>) -> Result<usize> {
        self.inner.mark_all_read(period)
    }

    fn delete_alert(&self, id: i64) -> Result<()> {
        self.inner.delete_alert(id)
    }

    fn list_alerts(&self, unread_only: bool, period: Option<Period>) -> Result<Vec<BudgetAlert>> {
        self.inner.list_alerts(unread_only, period)
    }
}

#[test]
fn unfiltered_transactions_are_restricted_to_period() {
    let conn = setup();
    let inner = SqliteStore::new(&conn);
    inner
        .set_budget("Loyer", dec!(1000), Currency::Xof, june())
        .unwrap();
    spend(&inner, "Loyer", dec!(700), 1);
    record(
        &inner,
        TransactionKind::Expense,
        "Loyer",
        dec!(700),
        Currency::Xof,
        (2024, 5, 31),
    );
    let store = FlakyStore {
        inner,
        upserts: Cell::new(0),
        fail_on: 0,
    };
    let raised = evaluate_at(&store, june(), &AlertPolicy::default(), at(2, 9)).unwrap();
    assert!(raised.is_empty());
}

#[test]
fn persistence_failure_keeps_earlier_upserts() {
    let conn = setup();
    let inner = SqliteStore::new(&conn);
    for cat in ["A", "B", "C"] {
        inner
            .set_budget(cat, dec!(100), Currency::Xof, june())
            .unwrap();
        spend(&inner, cat, dec!(90), 1);
    }
    let store = FlakyStore {
        inner,
        upserts: Cell::new(0),
        fail_on: 2,
    };

    let res = evaluate_at(&store, june(), &AlertPolicy::default(), at(1, 9));
    assert!(matches!(res, Err(Error::Persistence(_))));

    let stored = store.list_alerts(false, None).unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category, "A");
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Runtime settings persisted in the `settings` key/value table.

use rusqlite::{Connection, OptionalExtension, params};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::alerts::AlertPolicy;
use crate::currency::Currency;
use crate::errors::{Error, Result};

pub const DISPLAY_CURRENCY: &str = "display_currency";
pub const ALERT_THRESHOLD: &str = "alert_threshold";
pub const RENOTIFY_AFTER_READ: &str = "renotify_after_read";

pub const KEYS: [&str; 3] = [DISPLAY_CURRENCY, ALERT_THRESHOLD, RENOTIFY_AFTER_READ];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    pub display_currency: Currency,
    pub alert_threshold: Decimal,
    pub renotify_after_read: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            display_currency: Currency::base(),
            alert_threshold: Decimal::from(80),
            renotify_after_read: false,
        }
    }
}

impl Settings {
    pub fn load(conn: &Connection) -> Result<Settings> {
        let mut s = Settings::default();
        if let Some(v) = get(conn, DISPLAY_CURRENCY)? {
            s.display_currency = v.parse()?;
        }
        if let Some(v) = get(conn, ALERT_THRESHOLD)? {
            s.alert_threshold = parse_threshold(&v)?;
        }
        if let Some(v) = get(conn, RENOTIFY_AFTER_READ)? {
            s.renotify_after_read = parse_bool(&v)?;
        }
        Ok(s)
    }

    pub fn alert_policy(&self) -> AlertPolicy {
        AlertPolicy {
            threshold: self.alert_threshold,
            renotify_after_read: self.renotify_after_read,
        }
    }

    pub fn entries(&self) -> Vec<(String, String)> {
        vec![
            (DISPLAY_CURRENCY.into(), self.display_currency.to_string()),
            (ALERT_THRESHOLD.into(), self.alert_threshold.to_string()),
            (RENOTIFY_AFTER_READ.into(), self.renotify_after_read.to_string()),
        ]
    }
}

pub fn get(conn: &Connection, key: &str) -> Result<Option<String>> {
    let v: Option<String> = conn
        .query_row(
            "SELECT value FROM settings WHERE key=?1",
            params![key],
            |r| r.get(0),
        )
        .optional()?;
    Ok(v)
}

/// Validates `value` for `key` and stores its normalized form.
pub fn set(conn: &Connection, key: &str, value: &str) -> Result<String> {
    let normalized = match key {
        DISPLAY_CURRENCY => value.parse::<Currency>()?.to_string(),
        ALERT_THRESHOLD => parse_threshold(value)?.to_string(),
        RENOTIFY_AFTER_READ => parse_bool(value)?.to_string(),
        other => {
            return Err(Error::Validation(format!(
                "unknown setting '{}', expected one of {}",
                other,
                KEYS.join(", ")
            )));
        }
    };
    conn.execute(
        "INSERT INTO settings(key, value) VALUES(?1, ?2)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        params![key, normalized],
    )?;
    Ok(normalized)
}

fn parse_threshold(s: &str) -> Result<Decimal> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_| Error::Validation(format!("invalid threshold '{}'", s)))?;
    if d <= Decimal::ZERO {
        return Err(Error::Validation(format!(
            "threshold must be positive, got {}",
            d
        )));
    }
    Ok(d)
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(Error::Validation(format!("invalid boolean '{}'", other))),
    }
}

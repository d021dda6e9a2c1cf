// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-rate conversion between the base currency (XOF) and the single
//! supported foreign currency (EUR). Every conversion routes through the base.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Xof,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Xof, Currency::Eur];

    pub fn base() -> Currency {
        Currency::Xof
    }

    pub fn is_base(self) -> bool {
        self == Currency::base()
    }

    pub fn code(self) -> &'static str {
        match self {
            Currency::Xof => "XOF",
            Currency::Eur => "EUR",
        }
    }

    /// XOF has no fractional unit in display.
    pub fn decimal_places(self) -> u32 {
        match self {
            Currency::Xof => 0,
            Currency::Eur => 2,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "XOF" | "FCFA" | "CFA" => Ok(Currency::Xof),
            "EUR" => Ok(Currency::Eur),
            _ => Err(Error::InvalidCurrency(s.to_string())),
        }
    }
}

/// Units of base currency per one unit of `ccy`.
pub fn rate(ccy: Currency) -> Decimal {
    match ccy {
        Currency::Xof => Decimal::ONE,
        Currency::Eur => Decimal::from(660),
    }
}

/// Saturates at `Decimal::MAX`/`Decimal::MIN` outside the representable range.
pub fn to_base(amount: Decimal, from: Currency) -> Decimal {
    checked_to_base(amount, from).unwrap_or_else(|_| {
        if amount.is_sign_negative() {
            Decimal::MIN
        } else {
            Decimal::MAX
        }
    })
}

pub fn checked_to_base(amount: Decimal, from: Currency) -> Result<Decimal, Error> {
    if from.is_base() {
        return Ok(amount);
    }
    amount.checked_mul(rate(from)).ok_or_else(|| {
        Error::Validation(format!("{} {} is out of range in {}", amount, from, Currency::base()))
    })
}

pub fn from_base(amount: Decimal, to: Currency) -> Decimal {
    if to.is_base() {
        return amount;
    }
    amount / rate(to)
}

pub fn convert(amount: Decimal, from: Currency, to: Currency) -> Decimal {
    if from == to {
        return amount;
    }
    from_base(to_base(amount, from), to)
}

pub fn fmt_money(amount: Decimal, ccy: Currency) -> String {
    let dp = ccy.decimal_places() as usize;
    format!("{:.*} {}", dp, amount.round_dp(ccy.decimal_places()), ccy)
}

// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{self, Settings};
use crate::utils::{maybe_print_json, pretty_table, required};
use anyhow::{Result, anyhow};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            let settings = Settings::load(conn)?;
            let (_, value) = settings
                .entries()
                .into_iter()
                .find(|(k, _)| k == key)
                .ok_or_else(|| anyhow!("Unknown setting '{}'", key))?;
            println!("{}", value);
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = config::set(conn, key, required(sub, "value")?)?;
            println!("{} = {}", key, value);
        }
        Some(("list", sub)) => {
            let settings = Settings::load(conn)?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &settings)? {
                let rows = settings
                    .entries()
                    .into_iter()
                    .map(|(k, v)| vec![k, v])
                    .collect();
                println!("{}", pretty_table(&["Key", "Value"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}

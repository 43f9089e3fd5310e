//! CSV format handling for ledger commands and account output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to ledger commands
//! - Account report serialization
//!
//! All functions are pure (no I/O) for easy testing.
//!
//! # Input columns
//!
//! `command,account,counterparty,amount,name`
//!
//! | command    | account | counterparty | amount | name |
//! |------------|---------|--------------|--------|------|
//! | `open`     |         |              |        | yes  |
//! | `seed`     | yes     |              | yes    |      |
//! | `transfer` | source  | destination  | yes    |      |

use crate::types::{AccountId, LedgerCommand};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// One raw row of a replay file
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub command: String,
    pub account: Option<AccountId>,
    pub counterparty: Option<AccountId>,
    pub amount: Option<String>,
    pub name: Option<String>,
}

/// One row of the account report
#[derive(Debug, Clone, PartialEq)]
pub struct AccountReport {
    pub account: AccountId,
    pub name: String,
    /// Cached balance
    pub balance: Decimal,
    /// Balance rebuilt from the movement log
    pub reconstructed: Decimal,
}

fn parse_amount(csv_record: &CsvRecord) -> Result<Decimal, String> {
    match csv_record.amount.as_deref().map(str::trim) {
        Some(amount) if !amount.is_empty() => Decimal::from_str(amount)
            .map_err(|_| format!("Invalid amount '{}' for {}", amount, csv_record.command)),
        _ => Err(format!("{} command requires an amount", csv_record.command)),
    }
}

fn require_account(
    value: Option<AccountId>,
    column: &str,
    csv_record: &CsvRecord,
) -> Result<AccountId, String> {
    value.ok_or_else(|| format!("{} command requires the {} column", csv_record.command, column))
}

/// Convert a raw CSV row into a ledger command
///
/// Command names are case insensitive. Columns a command does not use are
/// ignored.
pub fn convert_csv_record(csv_record: CsvRecord) -> Result<LedgerCommand, String> {
    match csv_record.command.to_lowercase().as_str() {
        "open" => {
            let name = csv_record
                .name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .ok_or_else(|| "open command requires a name".to_string())?;
            Ok(LedgerCommand::Open {
                name: name.to_string(),
            })
        }
        "seed" => Ok(LedgerCommand::Seed {
            account: require_account(csv_record.account, "account", &csv_record)?,
            amount: parse_amount(&csv_record)?,
        }),
        "transfer" => Ok(LedgerCommand::Transfer {
            source: require_account(csv_record.account, "account", &csv_record)?,
            destination: require_account(csv_record.counterparty, "counterparty", &csv_record)?,
            amount: parse_amount(&csv_record)?,
        }),
        _ => Err(format!("Invalid command: '{}'", csv_record.command)),
    }
}

/// Write the account report as CSV
///
/// Rows are sorted by account ID and amounts are printed with `scale`
/// decimal places.
pub fn write_accounts_csv(
    reports: &[AccountReport],
    scale: u32,
    output: &mut dyn Write,
) -> Result<(), String> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);
    let precision = scale as usize;

    writer
        .write_record(["account", "name", "balance", "reconstructed"])
        .map_err(|e| format!("Failed to write CSV header: {}", e))?;

    let mut sorted = reports.to_vec();
    sorted.sort_by_key(|report| report.account);

    for report in sorted {
        writer
            .write_record(&[
                report.account.to_string(),
                report.name,
                format!("{:.*}", precision, report.balance),
                format!("{:.*}", precision, report.reconstructed),
            ])
            .map_err(|e| format!("Failed to write account record: {}", e))?;
    }

    writer
        .flush()
        .map_err(|e| format!("Failed to flush output: {}", e))?;

    Ok(())
}

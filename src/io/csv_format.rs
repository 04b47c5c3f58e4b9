//! CSV format handling for operation scripts and the account report
//!
//! This module centralizes all CSV format concerns, providing:
//! - `ScriptRow` structure for deserialization
//! - Conversion from script rows to `ScriptCommand`s
//! - Account report serialization
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{LedgerError, LockingMode, TransactionType};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Raw script row
///
/// Matches the input CSV format with columns:
/// `type, account, currency, amount, locking, reason`.
/// Everything after `account` is optional; which fields are required depends
/// on the operation type.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
pub struct ScriptRow {
    #[serde(rename = "type")]
    pub op: String,
    pub account: String,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub locking: Option<String>,
    #[serde(default)]
    pub reason: Option<String>,
}

/// One operation of a script
///
/// `account` is the owner label used throughout the script; the runner maps
/// it to the identifier assigned when the account was opened.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Open {
        owner: String,
        /// Validated by the coordinator
        currency: String,
        seed: Option<Decimal>,
    },
    Transact {
        owner: String,
        tx_type: TransactionType,
        amount: Decimal,
        /// `None` uses the run's default locking mode
        locking_mode: Option<LockingMode>,
        reason: Option<String>,
    },
}

impl ScriptCommand {
    pub fn owner(&self) -> &str {
        match self {
            ScriptCommand::Open { owner, .. } | ScriptCommand::Transact { owner, .. } => owner,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, ScriptCommand::Open { .. })
    }
}

/// Script command together with the line it came from
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptRecord {
    pub line: u64,
    pub command: ScriptCommand,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_error(line: u64, message: String) -> LedgerError {
    LedgerError::ParseError {
        line: Some(line),
        message,
    }
}

fn parse_amount(raw: &str, line: u64) -> Result<Decimal, LedgerError> {
    Decimal::from_str(raw).map_err(|_| parse_error(line, format!("Invalid amount '{}'", raw)))
}

/// Convert a `ScriptRow` read from `line` into a `ScriptCommand`
///
/// This function:
/// - Parses the operation type (case insensitive)
/// - Parses the amount string into a Decimal (if present)
/// - Checks that deposits and withdrawals carry an amount and opens a currency
/// - Parses the optional locking mode
///
/// Business validation (amount sign and scale, currency shape, reason
/// length) is left to the coordinator.
///
/// # Errors
///
/// Returns [`LedgerError::ParseError`] carrying `line` if the row is malformed.
pub fn convert_script_row(row: ScriptRow, line: u64) -> Result<ScriptCommand, LedgerError> {
    let owner = row.account.trim().to_string();
    if owner.is_empty() {
        return Err(parse_error(line, "Missing account label".to_string()));
    }

    let amount = non_empty(row.amount);
    let op = row.op.trim().to_lowercase();

    match op.as_str() {
        "open" => {
            let currency = non_empty(row.currency).ok_or_else(|| {
                parse_error(line, format!("Open of '{}' requires a currency", owner))
            })?;
            let seed = amount.map(|raw| parse_amount(&raw, line)).transpose()?;
            Ok(ScriptCommand::Open {
                owner,
                currency,
                seed,
            })
        }
        "deposit" | "withdrawal" => {
            let tx_type = if op == "deposit" {
                TransactionType::Deposit
            } else {
                TransactionType::Withdrawal
            };
            let raw = amount.ok_or_else(|| {
                parse_error(
                    line,
                    format!("{} for '{}' requires an amount", tx_type.as_str(), owner),
                )
            })?;
            let amount = parse_amount(&raw, line)?;

            let locking_mode = match non_empty(row.locking) {
                None => None,
                Some(mode) => Some(match mode.to_lowercase().as_str() {
                    "optimistic" => LockingMode::Optimistic,
                    "pessimistic" => LockingMode::Pessimistic,
                    _ => return Err(parse_error(line, format!("Invalid locking mode '{}'", mode))),
                }),
            };

            Ok(ScriptCommand::Transact {
                owner,
                tx_type,
                amount,
                locking_mode,
                reason: non_empty(row.reason),
            })
        }
        _ => Err(parse_error(
            line,
            format!("Invalid operation type: '{}'", row.op.trim()),
        )),
    }
}

fn write_error(error: csv::Error) -> LedgerError {
    LedgerError::IoError {
        message: format!("Failed to write account report: {}", error),
    }
}

/// Final state of one scripted account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountReport {
    pub owner: String,
    pub currency: String,
    pub balance: Decimal,
    pub version: u64,
    /// Number of committed ledger entries
    pub entries: usize,
}

/// Write the account report in CSV format
///
/// Columns: owner, currency, balance, version, entries.
/// Rows are sorted by owner for deterministic output.
///
/// # Errors
///
/// Returns [`LedgerError::IoError`] if a write error occurred.
pub fn write_accounts_csv(
    reports: &[AccountReport],
    output: &mut dyn Write,
) -> Result<(), LedgerError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["owner", "currency", "balance", "version", "entries"])
        .map_err(write_error)?;

    let mut sorted = reports.to_vec();
    sorted.sort_by(|a, b| a.owner.cmp(&b.owner));

    for report in sorted {
        writer
            .write_record(&[
                report.owner,
                report.currency,
                format!("{:.2}", report.balance),
                report.version.to_string(),
                report.entries.to_string(),
            ])
            .map_err(write_error)?;
    }

    writer.flush()?;
    Ok(())
}

//! Monetary value helpers
//!
//! Amounts and balances are fixed-point decimals with two decimal places.
//! The core validates every amount it is handed instead of trusting the
//! boundary layer.

use super::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of decimal places kept for amounts and balances
pub const MONEY_SCALE: u32 = 2;

/// Largest amount accepted for a single deposit, withdrawal or seed (999,999,999.99)
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_215_752_191, 23, 0, false, 2);

/// Rescale a value to exactly two decimal places
pub fn to_money(value: Decimal) -> Decimal {
    let mut value = value;
    value.rescale(MONEY_SCALE);
    value
}

/// Validate a transaction amount
///
/// # Errors
///
/// Returns [`LedgerError::InvalidAmount`] if the amount is zero or negative,
/// has more than two significant decimal places, or exceeds [`MAX_AMOUNT`].
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::invalid_amount(amount, "must be greater than zero"));
    }
    check_bounds(amount)
}

/// Validate an account opening seed
///
/// Same rules as [`validate_amount`] except that zero is accepted.
pub fn validate_seed(seed: Decimal) -> Result<Decimal, LedgerError> {
    if seed < Decimal::ZERO {
        return Err(LedgerError::invalid_amount(seed, "cannot be negative"));
    }
    check_bounds(seed)
}

fn check_bounds(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerError::invalid_amount(
            amount,
            "cannot have more than 2 decimal places",
        ));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerError::invalid_amount(amount, "exceeds maximum allowed value"));
    }
    Ok(to_money(amount))
}

/// Three-letter ISO 4217 style currency code
///
/// Only the shape is checked (three ASCII uppercase letters); the engine
/// does no currency conversion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub const USD: &'static str = "USD";
    pub const EUR: &'static str = "EUR";
    pub const GBP: &'static str = "GBP";
    pub const JPY: &'static str = "JPY";
    pub const TWD: &'static str = "TWD";

    /// Parse and validate a currency code
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidCurrency`] unless the code is exactly
    /// three ASCII uppercase letters.
    pub fn parse(code: &str) -> Result<Self, LedgerError> {
        let code = code.trim();
        if code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase()) {
            Ok(Self(code.to_string()))
        } else {
            Err(LedgerError::invalid_currency(code))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for CurrencyCode {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for CurrencyCode {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CurrencyCode> for String {
    fn from(code: CurrencyCode) -> Self {
        code.0
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

//! Balance mutation
//!
//! `BalanceMutator` is the only code that changes an account balance. It is
//! pure: it returns an updated copy and leaves persistence to the caller.

use crate::types::{Account, Direction, LedgerError};
use rust_decimal::Decimal;

/// Applies a signed delta to an account
#[derive(Debug, Clone, Copy, Default)]
pub struct BalanceMutator;

impl BalanceMutator {
    /// Apply `amount` to `account` in the given direction
    ///
    /// # Arguments
    ///
    /// * `account` - Account as read from the store
    /// * `direction` - `Credit` adds, `Debit` subtracts
    /// * `amount` - Non-negative magnitude, already validated
    ///
    /// # Returns
    ///
    /// A copy of `account` carrying the new balance. The version is untouched;
    /// the store bumps it when the write commits.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::InsufficientFunds`] if a debit would make the balance negative
    /// - [`LedgerError::ArithmeticOverflow`] if the new balance cannot be represented
    pub fn apply(
        &self,
        account: &Account,
        direction: Direction,
        amount: Decimal,
    ) -> Result<Account, LedgerError> {
        let balance = account.balance();

        let new_balance = match direction {
            Direction::Credit => balance
                .checked_add(amount)
                .ok_or_else(|| LedgerError::arithmetic_overflow("credit", account.id))?,
            Direction::Debit => {
                let remaining = balance
                    .checked_sub(amount)
                    .ok_or_else(|| LedgerError::arithmetic_overflow("debit", account.id))?;
                if remaining < Decimal::ZERO {
                    return Err(LedgerError::insufficient_funds(account.id, amount, balance));
                }
                remaining
            }
        };

        let mut updated = account.clone();
        updated.set_balance(new_balance);
        Ok(updated)
    }
}

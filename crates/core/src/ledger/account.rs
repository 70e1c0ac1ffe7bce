//! Account domain types.

use ledger_shared::types::AccountNumber;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;

/// An account and its current balance in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Unique, immutable account number.
    pub account_number: AccountNumber,
    /// Balance in minor currency units.
    pub balance: i32,
}

impl Account {
    /// Returns true if the balance covers a debit of `value`.
    ///
    /// The boundary is inclusive: a debit equal to the balance is allowed.
    #[must_use]
    pub const fn can_debit(&self, value: i32) -> bool {
        self.balance >= value
    }

    /// Returns the balance after debiting `value`.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientBalance` if the balance does not cover `value`.
    pub fn debited(&self, value: i32) -> Result<i32, LedgerError> {
        if !self.can_debit(value) {
            return Err(LedgerError::InsufficientBalance {
                account: self.account_number,
                balance: self.balance,
                requested: value,
            });
        }
        self.balance
            .checked_sub(value)
            .ok_or(LedgerError::BalanceOverflow(self.account_number))
    }

    /// Returns the balance after crediting `value`.
    ///
    /// # Errors
    ///
    /// Returns `BalanceOverflow` if the new balance does not fit the column type.
    pub fn credited(&self, value: i32) -> Result<i32, LedgerError> {
        self.balance
            .checked_add(value)
            .ok_or(LedgerError::BalanceOverflow(self.account_number))
    }
}

/// Input for creating an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountParams {
    /// Account number (must not exist yet).
    pub account_number: AccountNumber,
    /// Opening balance.
    pub balance: i32,
}

impl From<CreateAccountParams> for Account {
    fn from(params: CreateAccountParams) -> Self {
        Self {
            account_number: params.account_number,
            balance: params.balance,
        }
    }
}

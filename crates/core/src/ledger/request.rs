//! Transaction requests.
//!
//! [`CreateTransactionParams`] is the flat wire format where account fields are
//! optional. [`TransactionRequest`] is what the engine dispatches on: each
//! variant carries exactly the fields its protocol needs.

use ledger_shared::types::AccountNumber;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::transaction::TransactionType;

/// Wire-format request for creating a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionParams {
    /// Deposit, withdrawal or transfer.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Target account (deposit and withdrawal).
    #[serde(default)]
    pub account: Option<AccountNumber>,
    /// Source account (transfer).
    #[serde(default)]
    pub from: Option<AccountNumber>,
    /// Destination account (transfer).
    #[serde(default)]
    pub to: Option<AccountNumber>,
    /// Magnitude to move.
    pub value: i32,
}

/// A validated transaction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionRequest {
    /// Credit `value` to `account`.
    Deposit {
        /// Target account.
        account: AccountNumber,
        /// Positive value.
        value: i32,
    },
    /// Debit `value` from `account`.
    Withdrawal {
        /// Target account.
        account: AccountNumber,
        /// Positive value.
        value: i32,
    },
    /// Move `value` from `from` to `to`.
    Transfer {
        /// Source account.
        from: AccountNumber,
        /// Destination account.
        to: AccountNumber,
        /// Positive value.
        value: i32,
    },
}

impl TransactionRequest {
    /// Returns the transaction type of this request.
    #[must_use]
    pub const fn transaction_type(&self) -> TransactionType {
        match self {
            Self::Deposit { .. } => TransactionType::Deposit,
            Self::Withdrawal { .. } => TransactionType::Withdrawal,
            Self::Transfer { .. } => TransactionType::Transfer,
        }
    }

    /// Returns the value moved by this request.
    #[must_use]
    pub const fn value(&self) -> i32 {
        match self {
            Self::Deposit { value, .. }
            | Self::Withdrawal { value, .. }
            | Self::Transfer { value, .. } => *value,
        }
    }

    /// Checks that the value is positive and a transfer has two distinct sides.
    ///
    /// # Errors
    ///
    /// Returns `SelfTransfer` or `InvalidValue`.
    pub fn validate(&self) -> Result<(), LedgerError> {
        if let Self::Transfer { from, to, .. } = self {
            if from == to {
                return Err(LedgerError::SelfTransfer(*from));
            }
        }

        let value = self.value();
        if value <= 0 {
            return Err(LedgerError::InvalidValue(value));
        }
        Ok(())
    }
}

impl TryFrom<CreateTransactionParams> for TransactionRequest {
    type Error = LedgerError;

    fn try_from(params: CreateTransactionParams) -> Result<Self, Self::Error> {
        let value = params.value;

        let request = match params.transaction_type {
            TransactionType::Deposit => Self::Deposit {
                account: params.account.ok_or(LedgerError::MissingField("account"))?,
                value,
            },
            TransactionType::Withdrawal => Self::Withdrawal {
                account: params.account.ok_or(LedgerError::MissingField("account"))?,
                value,
            },
            TransactionType::Transfer => {
                let from = params.from.ok_or(LedgerError::MissingField("from"))?;
                let to = params.to.ok_or(LedgerError::MissingField("to"))?;
                Self::Transfer { from, to, value }
            }
        };

        request.validate()?;
        Ok(request)
    }
}

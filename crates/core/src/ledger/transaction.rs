//! Transaction record domain types.
//!
//! A record is one leg of a transaction: a deposit produces one credit record,
//! a withdrawal one debit record, and a transfer a debit on the source paired
//! with a credit on the destination. Records are immutable once persisted.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use ledger_shared::types::{AccountNumber, TransactionId};
use serde::{Deserialize, Serialize};

/// Kind of transaction a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money entering an account.
    #[serde(alias = "DEPOSIT")]
    Deposit,
    /// Money leaving an account.
    #[serde(alias = "WITHDRAWAL")]
    Withdrawal,
    /// Money moving between two accounts.
    #[serde(alias = "TRANSFER")]
    Transfer,
}

/// Which side of the ledger a record represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Increases the account balance.
    #[serde(alias = "CREDIT")]
    Credit,
    /// Decreases the account balance.
    #[serde(alias = "DEBIT")]
    Debit,
}

/// Error returned when a stored type or kind string is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what} '{value}'")]
pub struct ParseEnumError {
    what: &'static str,
    value: String,
}

impl TransactionType {
    /// Returns the value persisted in the `type` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "deposit",
            Self::Withdrawal => "withdrawal",
            Self::Transfer => "transfer",
        }
    }
}

impl TransactionKind {
    /// Returns the value persisted in the `kind` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl fmt::Display for TransactionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deposit" => Ok(Self::Deposit),
            "withdrawal" => Ok(Self::Withdrawal),
            "transfer" => Ok(Self::Transfer),
            _ => Err(ParseEnumError {
                what: "transaction type",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for TransactionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            _ => Err(ParseEnumError {
                what: "transaction kind",
                value: s.to_string(),
            }),
        }
    }
}

/// A record that has not been persisted yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewTransactionRecord {
    /// Account this leg is attributed to.
    pub account: AccountNumber,
    /// Transaction type.
    pub transaction_type: TransactionType,
    /// Credit or debit.
    pub kind: TransactionKind,
    /// Positive magnitude moved.
    pub value: i32,
    /// Transfer source (transfers only).
    pub from: Option<AccountNumber>,
    /// Transfer destination (transfers only).
    pub to: Option<AccountNumber>,
}

impl NewTransactionRecord {
    /// The single credit record of a deposit.
    #[must_use]
    pub const fn deposit(account: AccountNumber, value: i32) -> Self {
        Self {
            account,
            transaction_type: TransactionType::Deposit,
            kind: TransactionKind::Credit,
            value,
            from: None,
            to: None,
        }
    }

    /// The single debit record of a withdrawal.
    #[must_use]
    pub const fn withdrawal(account: AccountNumber, value: i32) -> Self {
        Self {
            account,
            transaction_type: TransactionType::Withdrawal,
            kind: TransactionKind::Debit,
            value,
            from: None,
            to: None,
        }
    }

    /// The two legs of a transfer: `[debit on from, credit on to]`.
    ///
    /// Both legs carry the full route and the same value.
    #[must_use]
    pub const fn transfer_legs(from: AccountNumber, to: AccountNumber, value: i32) -> [Self; 2] {
        let debit = Self {
            account: from,
            transaction_type: TransactionType::Transfer,
            kind: TransactionKind::Debit,
            value,
            from: Some(from),
            to: Some(to),
        };
        let credit = Self {
            account: to,
            kind: TransactionKind::Credit,
            ..debit
        };
        [debit, credit]
    }

    /// Attaches the store-assigned id and timestamp.
    #[must_use]
    pub const fn persisted(
        self,
        id: TransactionId,
        created_at: NaiveDateTime,
    ) -> TransactionRecord {
        TransactionRecord {
            id,
            account: self.account,
            transaction_type: self.transaction_type,
            kind: self.kind,
            value: self.value,
            from: self.from,
            to: self.to,
            created_at,
        }
    }
}

/// A persisted transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    /// Store-assigned identifier.
    pub id: TransactionId,
    /// Account this leg is attributed to.
    pub account: AccountNumber,
    /// Transaction type.
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Credit or debit.
    pub kind: TransactionKind,
    /// Positive magnitude moved.
    pub value: i32,
    /// Transfer source (transfers only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub from: Option<AccountNumber>,
    /// Transfer destination (transfers only).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub to: Option<AccountNumber>,
    /// Set when the record was persisted.
    pub created_at: NaiveDateTime,
}

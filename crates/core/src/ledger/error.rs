//! Ledger error types.
//!
//! Every error the engine produces is returned to the caller unchanged after
//! the unit of work has been rolled back. Store failures keep their original
//! error as the source.

use ledger_shared::{AppError, types::AccountNumber};
use thiserror::Error;

/// Boxed error coming from a store implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Account Errors ==========
    /// An account with this number is already persisted.
    #[error("Account already exists")]
    AlreadyExists(AccountNumber),

    /// Deposit or withdrawal target does not exist.
    #[error("Account {0} not found")]
    AccountNotFound(AccountNumber),

    /// One side of a transfer does not exist.
    #[error("Invalid account {0}")]
    InvalidAccount(AccountNumber),

    // ========== Request Errors ==========
    /// A field required by the transaction type is absent.
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    /// Transaction value must be positive.
    #[error("Transaction value must be positive, got {0}")]
    InvalidValue(i32),

    /// Transfer source and destination are the same account.
    #[error("Cannot transfer from account {0} to itself")]
    SelfTransfer(AccountNumber),

    // ========== Balance Errors ==========
    /// The debit would drive the balance negative.
    #[error("Insufficient balance")]
    InsufficientBalance {
        /// The account being debited.
        account: AccountNumber,
        /// Its balance when the check ran.
        balance: i32,
        /// The requested debit.
        requested: i32,
    },

    /// The credit would exceed the balance column range.
    #[error("Balance of account {0} would overflow")]
    BalanceOverflow(AccountNumber),

    // ========== Store Errors ==========
    /// Persistence I/O failed.
    #[error("Store error: {0}")]
    Store(#[source] BoxError),
}

impl LedgerError {
    /// Wraps a store failure.
    pub fn store(err: impl Into<BoxError>) -> Self {
        Self::Store(err.into())
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyExists(_) => "ALREADY_EXISTS",
            Self::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            Self::InvalidAccount(_) => "INVALID_ACCOUNT",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::InvalidValue(_) => "INVALID_VALUE",
            Self::SelfTransfer(_) => "SELF_TRANSFER",
            Self::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            Self::BalanceOverflow(_) => "BALANCE_OVERFLOW",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingField(_) | Self::InvalidValue(_) | Self::SelfTransfer(_) => 400,
            Self::AccountNotFound(_) | Self::InvalidAccount(_) => 404,
            Self::AlreadyExists(_) => 409,
            Self::InsufficientBalance { .. } | Self::BalanceOverflow(_) => 422,
            Self::Store(_) => 500,
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::MissingField(_)
            | LedgerError::InvalidValue(_)
            | LedgerError::SelfTransfer(_) => Self::Validation(message),
            LedgerError::AccountNotFound(_) | LedgerError::InvalidAccount(_) => {
                Self::NotFound(message)
            }
            LedgerError::AlreadyExists(_) => Self::Conflict(message),
            LedgerError::InsufficientBalance { .. } | LedgerError::BalanceOverflow(_) => {
                Self::BusinessRule(message)
            }
            LedgerError::Store(_) => Self::Database(message),
        }
    }
}

//! Store traits implemented by persistence backends.
//!
//! The engine never reaches for ambient state: every operation that must take
//! part in an atomic unit of work receives it as an explicit `&UnitOfWork`
//! argument. `commit` and `rollback` take the unit of work by value, so it is
//! released (its connection returned, its row locks dropped) when they
//! return, whatever the outcome.

use std::future::Future;

use ledger_shared::types::{AccountNumber, PageRequest, PageResponse};

use super::account::{Account, CreateAccountParams};
use super::error::LedgerError;
use super::transaction::{NewTransactionRecord, TransactionRecord};

/// Account persistence and the row-locking primitive.
///
/// This trait is implemented by the db crate over Postgres and by
/// [`InMemoryLedgerStore`](super::memory::InMemoryLedgerStore).
pub trait AccountStore: Send + Sync {
    /// Handle to one open atomic unit of work.
    type UnitOfWork: Send + Sync;

    /// Creates an account.
    ///
    /// Fails with `AlreadyExists` if the number is taken. Needs no lock.
    fn create_account(
        &self,
        params: CreateAccountParams,
    ) -> impl Future<Output = Result<Account, LedgerError>> + Send;

    /// Reads an account without locking it.
    fn find_account(
        &self,
        account_number: AccountNumber,
    ) -> impl Future<Output = Result<Option<Account>, LedgerError>> + Send;

    /// Reads an account and takes a write-intent row lock on it.
    ///
    /// The lock blocks other writers until `uow` commits or rolls back, but
    /// does not block plain reads. Returns `None` when the account does not
    /// exist; the caller decides which error that is.
    fn get_account_and_lock(
        &self,
        account_number: AccountNumber,
        uow: &Self::UnitOfWork,
    ) -> impl Future<Output = Result<Option<Account>, LedgerError>> + Send;

    /// Writes a new balance for an account locked by `uow`.
    ///
    /// Performs no validation; the caller has already checked sufficiency.
    fn update_account_balance(
        &self,
        account_number: AccountNumber,
        balance: i32,
        uow: &Self::UnitOfWork,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;
}

/// Transaction record persistence and unit-of-work lifecycle.
pub trait TransactionStore: AccountStore {
    /// Opens a new unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork, LedgerError>> + Send;

    /// Persists a record inside `uow`, assigning its id and timestamp.
    fn insert_transaction(
        &self,
        record: NewTransactionRecord,
        uow: &Self::UnitOfWork,
    ) -> impl Future<Output = Result<TransactionRecord, LedgerError>> + Send;

    /// Commits and releases the unit of work.
    fn commit(&self, uow: Self::UnitOfWork) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Rolls back and releases the unit of work.
    fn rollback(
        &self,
        uow: Self::UnitOfWork,
    ) -> impl Future<Output = Result<(), LedgerError>> + Send;

    /// Lists the records attributed to an account, newest first.
    fn list_transactions(
        &self,
        account_number: AccountNumber,
        page: PageRequest,
    ) -> impl Future<Output = Result<PageResponse<TransactionRecord>, LedgerError>> + Send;
}

//! Postgres implementation of the ledger store traits.
//!
//! A unit of work is a `SeaORM` [`DatabaseTransaction`]. Row locks taken
//! through it are held until it commits or rolls back; if it is dropped
//! without either, `SeaORM` rolls it back.

use ledger_core::ledger::{
    Account, AccountStore, CreateAccountParams, LedgerError, NewTransactionRecord,
    TransactionRecord, TransactionStore,
};
use ledger_shared::types::{AccountNumber, PageRequest, PageResponse};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};

use crate::repositories::{AccountRepository, TransactionRepository};

/// Ledger store backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    db: DatabaseConnection,
    accounts: AccountRepository,
}

impl PgLedgerStore {
    /// Creates a store over a connection pool.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        let accounts = AccountRepository::new(db.clone());
        Self { db, accounts }
    }
}

impl AccountStore for PgLedgerStore {
    type UnitOfWork = DatabaseTransaction;

    async fn create_account(&self, params: CreateAccountParams) -> Result<Account, LedgerError> {
        Ok(self.accounts.create_account(params).await?)
    }

    async fn find_account(
        &self,
        account_number: AccountNumber,
    ) -> Result<Option<Account>, LedgerError> {
        Ok(self.accounts.find_account(account_number).await?)
    }

    async fn get_account_and_lock(
        &self,
        account_number: AccountNumber,
        uow: &DatabaseTransaction,
    ) -> Result<Option<Account>, LedgerError> {
        Ok(AccountRepository::get_account_and_lock(uow, account_number).await?)
    }

    async fn update_account_balance(
        &self,
        account_number: AccountNumber,
        balance: i32,
        uow: &DatabaseTransaction,
    ) -> Result<(), LedgerError> {
        Ok(AccountRepository::update_account_balance(uow, account_number, balance).await?)
    }
}

impl TransactionStore for PgLedgerStore {
    async fn begin(&self) -> Result<DatabaseTransaction, LedgerError> {
        self.db.begin().await.map_err(LedgerError::store)
    }

    async fn insert_transaction(
        &self,
        record: NewTransactionRecord,
        uow: &DatabaseTransaction,
    ) -> Result<TransactionRecord, LedgerError> {
        Ok(TransactionRepository::insert(uow, record).await?)
    }

    async fn commit(&self, uow: DatabaseTransaction) -> Result<(), LedgerError> {
        uow.commit().await.map_err(LedgerError::store)
    }

    async fn rollback(&self, uow: DatabaseTransaction) -> Result<(), LedgerError> {
        uow.rollback().await.map_err(LedgerError::store)
    }

    async fn list_transactions(
        &self,
        account_number: AccountNumber,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, LedgerError> {
        Ok(TransactionRepository::list_for_account(&self.db, account_number, page).await?)
    }
}

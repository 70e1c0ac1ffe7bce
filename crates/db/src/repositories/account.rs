//! Account repository: creation, plain reads, row locks and balance writes.

use ledger_core::ledger::{Account, CreateAccountParams, LedgerError};
use ledger_shared::types::AccountNumber;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, QuerySelect, Select, Set, SqlErr,
    sea_query::{Expr, LockType},
};

use crate::entities::account;

/// Error types for account operations.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Account number already exists.
    #[error("Account {0} already exists")]
    AlreadyExists(AccountNumber),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<AccountError> for LedgerError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::AlreadyExists(number) => Self::AlreadyExists(number),
            AccountError::Database(e) => Self::store(e),
        }
    }
}

/// Repository for account operations.
#[derive(Debug, Clone)]
pub struct AccountRepository {
    db: DatabaseConnection,
}

impl AccountRepository {
    /// Creates a new account repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a new account.
    ///
    /// An existence check runs first; a concurrent insert of the same number
    /// still surfaces as `AlreadyExists` through the primary key violation.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyExists` if the number is taken.
    pub async fn create_account(
        &self,
        params: CreateAccountParams,
    ) -> Result<Account, AccountError> {
        let number = params.account_number;

        if self.find_account(number).await?.is_some() {
            return Err(AccountError::AlreadyExists(number));
        }

        let model = account::ActiveModel {
            account_number: Set(number.into_inner()),
            balance: Set(params.balance),
        };

        match model.insert(&self.db).await {
            Ok(created) => Ok(to_domain(created)),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AccountError::AlreadyExists(number))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Reads an account without locking it.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_account(
        &self,
        account_number: AccountNumber,
    ) -> Result<Option<Account>, AccountError> {
        let found = account::Entity::find_by_id(account_number.into_inner())
            .one(&self.db)
            .await?;
        Ok(found.map(to_domain))
    }

    /// Builds the locking read for one account.
    ///
    /// `FOR NO KEY UPDATE` blocks concurrent writers of the row but not plain
    /// reads, and does not conflict with key-share locks from inserts that
    /// reference the row.
    #[must_use]
    pub fn lock_query(account_number: AccountNumber) -> Select<account::Entity> {
        account::Entity::find()
            .filter(account::Column::AccountNumber.eq(account_number.into_inner()))
            .lock(LockType::NoKeyUpdate)
    }

    /// Reads an account and locks its row until `conn` ends.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn get_account_and_lock<C>(
        conn: &C,
        account_number: AccountNumber,
    ) -> Result<Option<Account>, AccountError>
    where
        C: ConnectionTrait,
    {
        let found = Self::lock_query(account_number).one(conn).await?;
        Ok(found.map(to_domain))
    }

    /// Writes a new balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub async fn update_account_balance<C>(
        conn: &C,
        account_number: AccountNumber,
        balance: i32,
    ) -> Result<(), AccountError>
    where
        C: ConnectionTrait,
    {
        account::Entity::update_many()
            .col_expr(account::Column::Balance, Expr::value(balance))
            .filter(account::Column::AccountNumber.eq(account_number.into_inner()))
            .exec(conn)
            .await?;
        Ok(())
    }
}

fn to_domain(model: account::Model) -> Account {
    Account {
        account_number: AccountNumber::new(model.account_number),
        balance: model.balance,
    }
}

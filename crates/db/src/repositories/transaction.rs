//! Transaction record repository.

use ledger_core::ledger::{
    LedgerError, NewTransactionRecord, TransactionKind, TransactionRecord, TransactionType,
    transaction::ParseEnumError,
};
use ledger_shared::types::{AccountNumber, PageRequest, PageResponse, TransactionId};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, NotSet, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use crate::entities::transaction;

/// Error types for transaction record operations.
#[derive(Debug, thiserror::Error)]
pub enum TransactionError {
    /// A stored row carries an unknown `type` or `kind`.
    #[error("Invalid stored column: {0}")]
    InvalidColumn(#[from] ParseEnumError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl From<TransactionError> for LedgerError {
    fn from(err: TransactionError) -> Self {
        Self::store(err)
    }
}

/// Repository for transaction records.
///
/// Inserts take the connection (usually an open `DatabaseTransaction`) per
/// call so records land in the caller's unit of work.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    /// Inserts one record; the database assigns `id` and `created_at`.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn insert<C>(
        conn: &C,
        record: NewTransactionRecord,
    ) -> Result<TransactionRecord, TransactionError>
    where
        C: ConnectionTrait,
    {
        let model = transaction::ActiveModel {
            id: NotSet,
            account: Set(record.account.into_inner()),
            transaction_type: Set(record.transaction_type.as_str().to_string()),
            value: Set(record.value),
            kind: Set(record.kind.as_str().to_string()),
            from_account: Set(record.from.map(AccountNumber::into_inner)),
            to_account: Set(record.to.map(AccountNumber::into_inner)),
            created_at: NotSet,
        };

        let inserted = model.insert(conn).await?;
        to_domain(inserted)
    }

    /// Lists records attributed to an account, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if a query fails or a stored row cannot be decoded.
    pub async fn list_for_account<C>(
        conn: &C,
        account_number: AccountNumber,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, TransactionError>
    where
        C: ConnectionTrait,
    {
        let page = page.normalized();
        let query = transaction::Entity::find()
            .filter(transaction::Column::Account.eq(account_number.into_inner()));

        let total = query.clone().count(conn).await?;

        let rows = query
            .order_by_desc(transaction::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(conn)
            .await?;

        let data = rows
            .into_iter()
            .map(to_domain)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

fn to_domain(model: transaction::Model) -> Result<TransactionRecord, TransactionError> {
    Ok(TransactionRecord {
        id: TransactionId::new(model.id),
        account: AccountNumber::new(model.account),
        transaction_type: model.transaction_type.parse::<TransactionType>()?,
        kind: model.kind.parse::<TransactionKind>()?,
        value: model.value,
        from: model.from_account.map(AccountNumber::new),
        to: model.to_account.map(AccountNumber::new),
        created_at: model.created_at,
    })
}

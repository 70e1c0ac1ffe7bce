//! Account routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use ledger_core::ledger::{
    Account, CreateAccountParams, LedgerError, TransactionRecord, TransactionStore,
};
use ledger_shared::types::{AccountNumber, PageRequest, PageResponse};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the account routes.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: TransactionStore + 'static,
{
    Router::new()
        .route("/account", post(create_account::<S>))
        .route("/account/{account_number}", get(get_account::<S>))
        .route(
            "/account/{account_number}/transactions",
            get(list_account_transactions::<S>),
        )
}

/// POST `/account` - Create an account with an opening balance.
async fn create_account<S: TransactionStore>(
    State(state): State<AppState<S>>,
    Json(params): Json<CreateAccountParams>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let account = state.store().create_account(params).await?;

    info!(
        account = %account.account_number,
        balance = account.balance,
        "Account created"
    );
    Ok((StatusCode::CREATED, Json(account)))
}

/// GET `/account/{account_number}` - Read an account without locking it.
async fn get_account<S: TransactionStore>(
    State(state): State<AppState<S>>,
    Path(account_number): Path<AccountNumber>,
) -> Result<Json<Account>, ApiError> {
    state
        .store()
        .find_account(account_number)
        .await?
        .map(Json)
        .ok_or_else(|| LedgerError::AccountNotFound(account_number).into())
}

/// GET `/account/{account_number}/transactions` - Records of an account, newest first.
async fn list_account_transactions<S: TransactionStore>(
    State(state): State<AppState<S>>,
    Path(account_number): Path<AccountNumber>,
    Query(page): Query<PageRequest>,
) -> Result<Json<PageResponse<TransactionRecord>>, ApiError> {
    if state.store().find_account(account_number).await?.is_none() {
        return Err(LedgerError::AccountNotFound(account_number).into());
    }

    let records = state
        .store()
        .list_transactions(account_number, page.normalized())
        .await?;
    Ok(Json(records))
}

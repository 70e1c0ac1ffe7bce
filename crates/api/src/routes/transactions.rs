//! Transaction routes.

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use ledger_core::ledger::{CreateTransactionParams, TransactionRecord, TransactionStore};
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the transaction routes.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: TransactionStore + 'static,
{
    Router::new().route("/transaction", post(create_transaction::<S>))
}

/// POST `/transaction` - Run a deposit, withdrawal or transfer.
///
/// Answers with one record, or `[debit, credit]` for a transfer.
async fn create_transaction<S: TransactionStore>(
    State(state): State<AppState<S>>,
    Json(params): Json<CreateTransactionParams>,
) -> Result<(StatusCode, Json<Vec<TransactionRecord>>), ApiError> {
    let records = state.engine().create_transaction(params).await?;

    info!(
        transaction_type = %params.transaction_type,
        records = records.len(),
        "Transaction created"
    );
    Ok((StatusCode::CREATED, Json(records)))
}

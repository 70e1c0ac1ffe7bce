//! Service status and batch operations.

use axum::{Json, Router, extract::State, routing::get};
use ledger_core::ledger::{MakeOperationsParams, MakeOperationsResponse, TransactionStore};

use crate::AppState;

/// GET `/` - Plain-text status of the ledger service.
async fn status<S: TransactionStore>(State(state): State<AppState<S>>) -> &'static str {
    state.operations.status()
}

/// POST `/` - Create accounts, then run transactions in order.
///
/// Always answers 200; per-item failures are listed in `errors`.
async fn make_operations<S: TransactionStore>(
    State(state): State<AppState<S>>,
    Json(params): Json<MakeOperationsParams>,
) -> Json<MakeOperationsResponse> {
    Json(state.operations.make_operations(params).await)
}

/// Creates the status and batch routes.
pub fn routes<S>() -> Router<AppState<S>>
where
    S: TransactionStore + 'static,
{
    Router::new().route("/", get(status::<S>).post(make_operations::<S>))
}

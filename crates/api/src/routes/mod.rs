//! API route definitions.

use axum::Router;
use ledger_core::ledger::TransactionStore;

use crate::AppState;

pub mod accounts;
pub mod health;
pub mod operations;
pub mod transactions;

/// Creates the API router with all routes.
pub fn api_routes<S>() -> Router<AppState<S>>
where
    S: TransactionStore + 'static,
{
    Router::new()
        .merge(health::routes())
        .merge(operations::routes())
        .merge(accounts::routes())
        .merge(transactions::routes())
}

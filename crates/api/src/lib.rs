//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST routes for accounts, transactions and batches
//! - JSON error responses built from ledger errors
//!
//! The router is generic over the ledger store, so the server runs it over
//! Postgres while tests run it over the in-memory store.

pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use ledger_core::ledger::{OperationsService, TransactionEngine, TransactionStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Debug)]
pub struct AppState<S> {
    /// Batch service, which also owns the transaction engine.
    pub operations: OperationsService<S>,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            operations: self.operations.clone(),
        }
    }
}

impl<S: TransactionStore> AppState<S> {
    /// Creates the state over a store.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            operations: OperationsService::new(store),
        }
    }

    /// Returns the transaction engine.
    #[must_use]
    pub const fn engine(&self) -> &TransactionEngine<S> {
        self.operations.engine()
    }

    /// Returns the ledger store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.operations.engine().store()
    }
}

/// Creates the main application router.
pub fn create_router<S>(state: AppState<S>) -> Router
where
    S: TransactionStore + 'static,
{
    Router::new()
        .merge(routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

//! Double-entry ledger logic.
//!
//! This module implements the core ledger functionality:
//! - Accounts and their balances
//! - Transaction records (one leg per record)
//! - Typed transaction requests converted from the wire format
//! - Store traits that carry an explicit unit of work
//! - The transaction engine (ordered locking, sufficiency checks, commit/rollback)
//! - Batch operations with per-item error reporting
//! - An in-memory store with real row-lock semantics

pub mod account;
pub mod engine;
pub mod error;
pub mod memory;
pub mod operations;
pub mod request;
pub mod store;
pub mod transaction;

#[cfg(test)]
mod engine_props;

pub use account::{Account, CreateAccountParams};
pub use engine::{TransactionEngine, lock_order};
pub use error::LedgerError;
pub use memory::{FailPoint, InMemoryLedgerStore, MemoryUnitOfWork, UnitOfWorkStats};
pub use operations::{MakeOperationsParams, MakeOperationsResponse, OperationsService};
pub use request::{CreateTransactionParams, TransactionRequest};
pub use store::{AccountStore, TransactionStore};
pub use transaction::{NewTransactionRecord, TransactionKind, TransactionRecord, TransactionType};

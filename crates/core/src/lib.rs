//! Core business logic for the ledger.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the store traits in [`ledger::store`],
//! which the db crate implements over Postgres.
//!
//! # Modules
//!
//! - `ledger` - Accounts, transaction records, the transaction engine and batch operations

pub mod ledger;

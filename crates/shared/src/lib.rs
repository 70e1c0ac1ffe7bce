//! Shared types, errors, and configuration for the ledger.
//!
//! This crate provides common types used across all other crates:
//! - Typed integer identifiers for accounts and transaction records
//! - Pagination types for list endpoints
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::AppError;

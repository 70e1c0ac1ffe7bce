//! Batch operations.
//!
//! A batch creates accounts and runs transactions independently of each
//! other. A failing item is reported as a string in `errors` and never aborts
//! its siblings; this is the only place where ledger errors are turned into
//! descriptions instead of being propagated.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::account::{Account, CreateAccountParams};
use super::engine::TransactionEngine;
use super::request::CreateTransactionParams;
use super::store::{AccountStore, TransactionStore};
use super::transaction::TransactionRecord;

/// A batch of account creations and transactions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeOperationsParams {
    /// Accounts to create.
    #[serde(default)]
    pub accounts: Vec<CreateAccountParams>,
    /// Transactions to run, in order.
    #[serde(default)]
    pub transactions: Vec<CreateTransactionParams>,
}

/// Outcome of a batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MakeOperationsResponse {
    /// Accounts created successfully.
    pub accounts: Vec<Account>,
    /// Record groups of the transactions that committed.
    pub transactions: Vec<Vec<TransactionRecord>>,
    /// One description per failed item.
    pub errors: Vec<String>,
}

/// Runs batches against a store.
#[derive(Debug)]
pub struct OperationsService<S> {
    engine: TransactionEngine<S>,
}

impl<S> Clone for OperationsService<S> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
        }
    }
}

impl<S: TransactionStore> OperationsService<S> {
    /// Creates a service over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self {
            engine: TransactionEngine::new(store),
        }
    }

    /// Returns the engine used for transactions.
    #[must_use]
    pub const fn engine(&self) -> &TransactionEngine<S> {
        &self.engine
    }

    /// Returns the service status string.
    #[must_use]
    pub const fn status(&self) -> &'static str {
        "Ok"
    }

    /// Runs a batch.
    ///
    /// Accounts are created concurrently, then transactions run one after the
    /// other in index order. Account errors are listed before transaction
    /// errors, each group in input order.
    pub async fn make_operations(&self, params: MakeOperationsParams) -> MakeOperationsResponse {
        let mut response = MakeOperationsResponse::default();
        let store = self.engine.store();

        let created = join_all(params.accounts.iter().map(|account| async move {
            (account.account_number, store.create_account(*account).await)
        }))
        .await;

        for (account_number, result) in created {
            match result {
                Ok(account) => response.accounts.push(account),
                Err(err) => {
                    warn!(account = %account_number, error = %err, "Batch account failed");
                    response
                        .errors
                        .push(format!("Account {account_number} - {err}"));
                }
            }
        }

        for (index, transaction) in params.transactions.into_iter().enumerate() {
            match self.engine.create_transaction(transaction).await {
                Ok(records) => response.transactions.push(records),
                Err(err) => {
                    warn!(index, error = %err, "Batch transaction failed");
                    response
                        .errors
                        .push(format!("Transaction in index {index} - {err}"));
                }
            }
        }

        info!(
            accounts = response.accounts.len(),
            transactions = response.transactions.len(),
            errors = response.errors.len(),
            "Batch processed"
        );
        response
    }
}

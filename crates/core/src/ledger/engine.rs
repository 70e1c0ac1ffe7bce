//! Transaction engine.
//!
//! Every call runs inside exactly one unit of work:
//!
//! ```text
//! OPEN ──protocol ok──▶ COMMITTED ──▶ RELEASED
//!   └───protocol err──▶ ROLLED_BACK ─▶ RELEASED
//! ```
//!
//! A protocol error is returned unchanged after the rollback. Release is
//! guaranteed by ownership: the store's `commit`/`rollback` consume the unit
//! of work.
//!
//! Transfers lock both accounts in ascending account-number order regardless
//! of direction, so two transfers over the same pair can never wait on each
//! other in a cycle.

use std::sync::Arc;

use ledger_shared::types::AccountNumber;
use tracing::{debug, error, info, warn};

use super::account::Account;
use super::error::LedgerError;
use super::request::{CreateTransactionParams, TransactionRequest};
use super::store::TransactionStore;
use super::transaction::{NewTransactionRecord, TransactionRecord};

/// Returns the order in which a transfer between `from` and `to` locks its accounts.
#[must_use]
pub fn lock_order(from: AccountNumber, to: AccountNumber) -> [AccountNumber; 2] {
    if from <= to { [from, to] } else { [to, from] }
}

/// Executes deposits, withdrawals and transfers atomically.
#[derive(Debug)]
pub struct TransactionEngine<S> {
    store: Arc<S>,
}

impl<S> Clone for TransactionEngine<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: TransactionStore> TransactionEngine<S> {
    /// Creates an engine over `store`.
    #[must_use]
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Returns the underlying store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Creates a transaction from wire-format params.
    ///
    /// Returns one record for deposits and withdrawals, and
    /// `[debit, credit]` for transfers.
    ///
    /// # Errors
    ///
    /// Returns the protocol's error after rolling back: `MissingField`,
    /// `InvalidValue`, `SelfTransfer`, `AccountNotFound`, `InvalidAccount`,
    /// `InsufficientBalance`, `BalanceOverflow`, or `Store`.
    pub async fn create_transaction(
        &self,
        params: CreateTransactionParams,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let uow = self.store.begin().await?;
        let result = match TransactionRequest::try_from(params) {
            Ok(request) => self.dispatch(request, &uow).await,
            Err(err) => Err(err),
        };
        self.finish(uow, result).await
    }

    /// Executes a request built directly rather than converted from params.
    ///
    /// The request is validated inside the unit of work like any other.
    ///
    /// # Errors
    ///
    /// Same as [`create_transaction`](Self::create_transaction).
    pub async fn execute(
        &self,
        request: TransactionRequest,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let uow = self.store.begin().await?;
        let result = self.dispatch(request, &uow).await;
        self.finish(uow, result).await
    }

    async fn dispatch(
        &self,
        request: TransactionRequest,
        uow: &S::UnitOfWork,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        request.validate()?;
        match request {
            TransactionRequest::Deposit { account, value } => {
                self.create_deposit(account, value, uow).await
            }
            TransactionRequest::Withdrawal { account, value } => {
                self.create_withdrawal(account, value, uow).await
            }
            TransactionRequest::Transfer { from, to, value } => {
                self.create_p2p(from, to, value, uow).await
            }
        }
    }

    async fn finish(
        &self,
        uow: S::UnitOfWork,
        result: Result<Vec<TransactionRecord>, LedgerError>,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        match result {
            Ok(records) => {
                self.store.commit(uow).await?;
                info!(records = records.len(), "Transaction committed");
                Ok(records)
            }
            Err(err) => {
                warn!(error = %err, code = err.error_code(), "Rolling back transaction");
                if let Err(rollback_err) = self.store.rollback(uow).await {
                    error!(error = %rollback_err, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// Locks both sides of a transfer in ascending account-number order.
    ///
    /// Returns `(from_account, to_account)` in semantic order. Stops before
    /// the second lock if the first account does not exist.
    async fn order_lock(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        uow: &S::UnitOfWork,
    ) -> Result<(Account, Account), LedgerError> {
        let [first, second] = lock_order(from, to);
        debug!(%first, %second, "Locking transfer accounts");

        let first_account = self
            .store
            .get_account_and_lock(first, uow)
            .await?
            .ok_or(LedgerError::InvalidAccount(first))?;
        let second_account = self
            .store
            .get_account_and_lock(second, uow)
            .await?
            .ok_or(LedgerError::InvalidAccount(second))?;

        if first_account.account_number == from {
            Ok((first_account, second_account))
        } else {
            Ok((second_account, first_account))
        }
    }

    async fn lock_single(
        &self,
        account: AccountNumber,
        uow: &S::UnitOfWork,
    ) -> Result<Account, LedgerError> {
        debug!(%account, "Locking account");
        self.store
            .get_account_and_lock(account, uow)
            .await?
            .ok_or(LedgerError::AccountNotFound(account))
    }

    async fn create_p2p(
        &self,
        from: AccountNumber,
        to: AccountNumber,
        value: i32,
        uow: &S::UnitOfWork,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let (from_account, to_account) = self.order_lock(from, to, uow).await?;

        let from_balance = from_account.debited(value)?;
        let to_balance = to_account.credited(value)?;

        let [debit, credit] = NewTransactionRecord::transfer_legs(from, to, value);
        let debit = self.store.insert_transaction(debit, uow).await?;
        let credit = self.store.insert_transaction(credit, uow).await?;

        self.store
            .update_account_balance(from, from_balance, uow)
            .await?;
        self.store.update_account_balance(to, to_balance, uow).await?;

        Ok(vec![debit, credit])
    }

    async fn create_withdrawal(
        &self,
        account: AccountNumber,
        value: i32,
        uow: &S::UnitOfWork,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let locked = self.lock_single(account, uow).await?;
        let balance = locked.debited(value)?;

        let debit = self
            .store
            .insert_transaction(NewTransactionRecord::withdrawal(account, value), uow)
            .await?;
        self.store
            .update_account_balance(account, balance, uow)
            .await?;

        Ok(vec![debit])
    }

    async fn create_deposit(
        &self,
        account: AccountNumber,
        value: i32,
        uow: &S::UnitOfWork,
    ) -> Result<Vec<TransactionRecord>, LedgerError> {
        let locked = self.lock_single(account, uow).await?;
        let balance = locked.credited(value)?;

        let credit = self
            .store
            .insert_transaction(NewTransactionRecord::deposit(account, value), uow)
            .await?;
        self.store
            .update_account_balance(account, balance, uow)
            .await?;

        Ok(vec![credit])
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::ledger::account::CreateAccountParams;
    use crate::ledger::memory::{FailPoint, InMemoryLedgerStore};
    use crate::ledger::store::{AccountStore, TransactionStore};
    use crate::ledger::transaction::{TransactionKind, TransactionType};
    use ledger_shared::types::PageRequest;
    use rstest::rstest;

    async fn engine_with(accounts: &[(i32, i32)]) -> TransactionEngine<InMemoryLedgerStore> {
        let store = Arc::new(InMemoryLedgerStore::new());
        for &(number, balance) in accounts {
            store
                .create_account(CreateAccountParams {
                    account_number: AccountNumber(number),
                    balance,
                })
                .await
                .unwrap();
        }
        TransactionEngine::new(store)
    }

    async fn balance(engine: &TransactionEngine<InMemoryLedgerStore>, number: i32) -> i32 {
        engine
            .store()
            .find_account(AccountNumber(number))
            .await
            .unwrap()
            .unwrap()
            .balance
    }

    fn deposit(account: i32, value: i32) -> TransactionRequest {
        TransactionRequest::Deposit {
            account: AccountNumber(account),
            value,
        }
    }

    fn withdrawal(account: i32, value: i32) -> TransactionRequest {
        TransactionRequest::Withdrawal {
            account: AccountNumber(account),
            value,
        }
    }

    fn transfer(from: i32, to: i32, value: i32) -> TransactionRequest {
        TransactionRequest::Transfer {
            from: AccountNumber(from),
            to: AccountNumber(to),
            value,
        }
    }

    #[tokio::test]
    async fn test_transfer_ledger_balance_law() {
        let engine = engine_with(&[(1, 200), (2, 300)]).await;

        let records = engine.execute(transfer(1, 2, 75)).await.unwrap();

        assert_eq!(balance(&engine, 1).await, 125);
        assert_eq!(balance(&engine, 2).await, 375);
        assert_eq!(records.len(), 2);
        let (debit, credit) = (&records[0], &records[1]);
        assert_eq!((debit.account, debit.kind), (AccountNumber(1), TransactionKind::Debit));
        assert_eq!((credit.account, credit.kind), (AccountNumber(2), TransactionKind::Credit));
        for record in &records {
            assert_eq!(record.value, 75);
            assert_eq!(record.transaction_type, TransactionType::Transfer);
            assert_eq!(record.from, Some(AccountNumber(1)));
            assert_eq!(record.to, Some(AccountNumber(2)));
        }
        assert_eq!(engine.store().committed_records().len(), 2);
    }

    #[tokio::test]
    async fn test_transfer_locks_in_ascending_order_both_directions() {
        let engine = engine_with(&[(1, 200), (2, 300)]).await;

        engine.execute(transfer(2, 1, 10)).await.unwrap();
        engine.execute(transfer(1, 2, 10)).await.unwrap();

        assert_eq!(
            engine.store().lock_log(),
            vec![AccountNumber(1), AccountNumber(2), AccountNumber(1), AccountNumber(2)]
        );
    }

    #[tokio::test]
    async fn test_reverse_transfer_returns_semantic_order() {
        let engine = engine_with(&[(1, 200), (2, 300)]).await;

        let records = engine.execute(transfer(2, 1, 300)).await.unwrap();

        assert_eq!(records[0].account, AccountNumber(2));
        assert_eq!(records[0].kind, TransactionKind::Debit);
        assert_eq!(records[1].account, AccountNumber(1));
        assert_eq!(balance(&engine, 2).await, 0);
        assert_eq!(balance(&engine, 1).await, 500);
    }

    #[tokio::test]
    async fn test_transfer_insufficient_balance_is_atomic() {
        let engine = engine_with(&[(1, 200), (2, 300)]).await;

        let err = engine.execute(transfer(1, 2, 201)).await.unwrap_err();

        assert!(matches!(
            err,
            LedgerError::InsufficientBalance {
                account: AccountNumber(1),
                balance: 200,
                requested: 201
            }
        ));
        assert_eq!(balance(&engine, 1).await, 200);
        assert_eq!(balance(&engine, 2).await, 300);
        assert!(engine.store().committed_records().is_empty());
        let stats = engine.store().stats();
        assert_eq!(stats.rolled_back, 1);
        assert_eq!(stats.open, 0);
    }

    #[tokio::test]
    async fn test_transfer_missing_lower_account_stops_before_second_lock() {
        let engine = engine_with(&[(5, 100)]).await;

        let err = engine.execute(transfer(5, 3, 10)).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAccount(AccountNumber(3))));
        assert!(engine.store().lock_log().is_empty());
    }

    #[tokio::test]
    async fn test_transfer_missing_higher_account() {
        let engine = engine_with(&[(1, 100)]).await;

        let err = engine.execute(transfer(1, 8, 10)).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidAccount(AccountNumber(8))));
        assert_eq!(engine.store().lock_log(), vec![AccountNumber(1)]);
        assert_eq!(balance(&engine, 1).await, 100);
    }

    #[tokio::test]
    async fn test_withdrawal_boundary_is_inclusive() {
        let engine = engine_with(&[(1, 200)]).await;

        let records = engine
            .execute(TransactionRequest::Withdrawal {
                account: AccountNumber(1),
                value: 200,
            })
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, TransactionKind::Debit);
        assert_eq!(records[0].transaction_type, TransactionType::Withdrawal);
        assert_eq!(balance(&engine, 1).await, 0);
    }

    #[tokio::test]
    async fn test_withdrawal_one_over_balance_fails() {
        let engine = engine_with(&[(1, 200)]).await;

        let err = engine
            .execute(TransactionRequest::Withdrawal {
                account: AccountNumber(1),
                value: 201,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(balance(&engine, 1).await, 200);
        assert!(engine.store().committed_records().is_empty());
    }

    #[tokio::test]
    async fn test_deposit_has_no_upper_bound_check() {
        let engine = engine_with(&[(1, 200)]).await;

        let records = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 1_000_000,
            })
            .await
            .unwrap();

        assert_eq!(records[0].kind, TransactionKind::Credit);
        assert_eq!(records[0].transaction_type, TransactionType::Deposit);
        assert_eq!(balance(&engine, 1).await, 1_000_200);
    }

    #[tokio::test]
    async fn test_deposit_overflow_rolls_back() {
        let engine = engine_with(&[(1, i32::MAX - 1)]).await;

        let err = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 2,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::BalanceOverflow(AccountNumber(1))));
        assert_eq!(balance(&engine, 1).await, i32::MAX - 1);
    }

    #[tokio::test]
    async fn test_unknown_account_for_single_leg() {
        let engine = engine_with(&[]).await;

        let err = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(42),
                value: 1,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::AccountNotFound(AccountNumber(42))));
    }

    #[tokio::test]
    async fn test_missing_field_rolls_back_opened_unit_of_work() {
        let engine = engine_with(&[(1, 200)]).await;

        let err = engine
            .create_transaction(CreateTransactionParams {
                transaction_type: TransactionType::Transfer,
                account: None,
                from: Some(AccountNumber(1)),
                to: None,
                value: 10,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::MissingField("to")));
        let stats = engine.store().stats();
        assert_eq!((stats.begun, stats.rolled_back, stats.open), (1, 1, 0));
    }

    #[tokio::test]
    async fn test_execute_rejects_self_transfer() {
        let engine = engine_with(&[(1, 100)]).await;

        let err = engine.execute(transfer(1, 1, 50)).await.unwrap_err();

        assert!(matches!(err, LedgerError::SelfTransfer(AccountNumber(1))));
        assert_eq!(balance(&engine, 1).await, 100);
        assert!(engine.store().lock_log().is_empty());
        assert!(engine.store().committed_records().is_empty());
    }

    #[rstest]
    #[case(withdrawal(1, -500), -500)]
    #[case(deposit(1, 0), 0)]
    #[case(transfer(1, 2, -5), -5)]
    #[tokio::test]
    async fn test_execute_rejects_non_positive_value(
        #[case] request: TransactionRequest,
        #[case] value: i32,
    ) {
        let engine = engine_with(&[(1, 100), (2, 0)]).await;

        let err = engine.execute(request).await.unwrap_err();

        assert!(matches!(err, LedgerError::InvalidValue(v) if v == value));
        assert_eq!(balance(&engine, 1).await, 100);
        assert_eq!(balance(&engine, 2).await, 0);
        assert!(engine.store().committed_records().is_empty());
        let stats = engine.store().stats();
        assert_eq!((stats.rolled_back, stats.open), (1, 0));
    }

    #[tokio::test]
    async fn test_insert_failure_leaves_no_trace() {
        let engine = engine_with(&[(1, 200), (2, 300)]).await;
        engine.store().fail_next(FailPoint::InsertTransaction);

        let err = engine.execute(transfer(1, 2, 50)).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(balance(&engine, 1).await, 200);
        assert_eq!(balance(&engine, 2).await, 300);
        assert!(engine.store().committed_records().is_empty());
    }

    #[tokio::test]
    async fn test_balance_update_failure_discards_inserted_records() {
        let engine = engine_with(&[(1, 200)]).await;
        engine.store().fail_next(FailPoint::UpdateBalance);

        let err = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 5,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(balance(&engine, 1).await, 200);
        assert!(engine.store().committed_records().is_empty());
    }

    #[tokio::test]
    async fn test_commit_failure_still_releases() {
        let engine = engine_with(&[(1, 200)]).await;
        engine.store().fail_next(FailPoint::Commit);

        let err = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 5,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(engine.store().stats().open, 0);
        assert_eq!(balance(&engine, 1).await, 200);

        // The row lock was released with the unit of work.
        engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 5,
            })
            .await
            .unwrap();
        assert_eq!(balance(&engine, 1).await, 205);
    }

    #[tokio::test]
    async fn test_rollback_failure_returns_original_error() {
        let engine = engine_with(&[(1, 200)]).await;
        engine.store().fail_next(FailPoint::Rollback);

        let err = engine
            .execute(TransactionRequest::Withdrawal {
                account: AccountNumber(1),
                value: 500,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::InsufficientBalance { .. }));
        assert_eq!(engine.store().stats().open, 0);
    }

    #[tokio::test]
    async fn test_begin_failure_propagates() {
        let engine = engine_with(&[(1, 200)]).await;
        engine.store().fail_next(FailPoint::Begin);

        let err = engine
            .execute(TransactionRequest::Deposit {
                account: AccountNumber(1),
                value: 5,
            })
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(_)));
        assert_eq!(engine.store().stats().begun, 0);
        assert_eq!(balance(&engine, 1).await, 200);
    }

    #[tokio::test]
    async fn test_opposite_transfers_do_not_deadlock() {
        let engine = engine_with(&[(1, 1_000), (2, 1_000)]).await;

        let forward = engine.execute(transfer(1, 2, 100));
        let backward = engine.execute(transfer(2, 1, 40));
        let (a, b) = tokio::time::timeout(Duration::from_secs(5), async {
            tokio::join!(forward, backward)
        })
        .await
        .expect("transfers deadlocked");

        a.unwrap();
        b.unwrap();
        assert_eq!(balance(&engine, 1).await, 940);
        assert_eq!(balance(&engine, 2).await, 1_060);
        for pair in engine.store().lock_log().chunks(2) {
            assert_eq!(pair, [AccountNumber(1), AccountNumber(2)]);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_withdrawals_never_overdraw() {
        let engine = engine_with(&[(1, 1_000)]).await;

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let engine = engine.clone();
                tokio::spawn(async move {
                    engine
                        .execute(TransactionRequest::Withdrawal {
                            account: AccountNumber(1),
                            value: 30,
                        })
                        .await
                })
            })
            .collect();

        let mut succeeded = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => succeeded += 1,
                Err(err) => assert!(matches!(err, LedgerError::InsufficientBalance { .. })),
            }
        }

        assert_eq!(succeeded, 33);
        assert_eq!(balance(&engine, 1).await, 10);
        let history = engine
            .store()
            .list_transactions(AccountNumber(1), PageRequest { page: 1, per_page: 100 })
            .await
            .unwrap();
        assert_eq!(history.meta.total, 33);
    }

    #[test]
    fn test_lock_order() {
        let ascending = [AccountNumber(1), AccountNumber(2)];
        assert_eq!(lock_order(AccountNumber(2), AccountNumber(1)), ascending);
        assert_eq!(lock_order(AccountNumber(1), AccountNumber(2)), ascending);
    }
}

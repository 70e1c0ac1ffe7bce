//! In-memory ledger store.
//!
//! Mirrors the Postgres store closely enough to exercise the engine's
//! locking and rollback behavior without a database: each account row has its
//! own async mutex standing in for a `FOR NO KEY UPDATE` row lock, writes made
//! inside a unit of work stay private to it until commit, and dropping a unit
//! of work releases its locks and discards its writes.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use ledger_shared::types::{AccountNumber, PageRequest, PageResponse, TransactionId};
use tokio::sync::OwnedMutexGuard;

use super::account::{Account, CreateAccountParams};
use super::error::LedgerError;
use super::store::{AccountStore, TransactionStore};
use super::transaction::{NewTransactionRecord, TransactionRecord};

/// Store operation that can be made to fail once, for exercising error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    /// Opening a unit of work.
    Begin,
    /// Locking an account row.
    Lock,
    /// Inserting a transaction record.
    InsertTransaction,
    /// Writing an account balance.
    UpdateBalance,
    /// Committing.
    Commit,
    /// Rolling back.
    Rollback,
}

/// Errors raised by the in-memory store itself.
#[derive(Debug, thiserror::Error)]
pub enum MemoryStoreError {
    /// A failure requested through [`InMemoryLedgerStore::fail_next`].
    #[error("injected failure at {0:?}")]
    Injected(FailPoint),

    /// Balance written for an account this unit of work has not locked.
    #[error("account {0} is not locked by this unit of work")]
    NotLocked(AccountNumber),
}

/// Unit-of-work lifecycle counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitOfWorkStats {
    /// Units of work opened.
    pub begun: usize,
    /// Units of work committed.
    pub committed: usize,
    /// Units of work rolled back.
    pub rolled_back: usize,
    /// Units of work not yet released.
    pub open: usize,
}

#[derive(Debug)]
struct Row {
    balance: i32,
    lock: Arc<tokio::sync::Mutex<()>>,
}

#[derive(Debug, Default)]
struct Shared {
    accounts: Mutex<BTreeMap<AccountNumber, Row>>,
    records: Mutex<Vec<TransactionRecord>>,
    next_id: AtomicI32,
    lock_log: Mutex<Vec<AccountNumber>>,
    fail_next: Mutex<Option<FailPoint>>,
    begun: AtomicUsize,
    committed: AtomicUsize,
    rolled_back: AtomicUsize,
    open: AtomicUsize,
}

fn guard<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Ledger store kept entirely in process memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLedgerStore {
    shared: Arc<Shared>,
}

/// Unit of work for [`InMemoryLedgerStore`].
#[derive(Debug)]
pub struct MemoryUnitOfWork {
    shared: Arc<Shared>,
    state: Mutex<PendingState>,
}

#[derive(Debug, Default)]
struct PendingState {
    held: BTreeMap<AccountNumber, OwnedMutexGuard<()>>,
    balances: HashMap<AccountNumber, i32>,
    records: Vec<TransactionRecord>,
}

impl Drop for MemoryUnitOfWork {
    fn drop(&mut self) {
        self.shared.open.fetch_sub(1, Ordering::SeqCst);
    }
}

impl InMemoryLedgerStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next call to `point` fail with a store error.
    pub fn fail_next(&self, point: FailPoint) {
        *guard(&self.shared.fail_next) = Some(point);
    }

    /// Returns every account lock acquisition so far, in order.
    #[must_use]
    pub fn lock_log(&self) -> Vec<AccountNumber> {
        guard(&self.shared.lock_log).clone()
    }

    /// Returns all committed records in insertion order.
    #[must_use]
    pub fn committed_records(&self) -> Vec<TransactionRecord> {
        guard(&self.shared.records).clone()
    }

    /// Returns unit-of-work lifecycle counters.
    #[must_use]
    pub fn stats(&self) -> UnitOfWorkStats {
        UnitOfWorkStats {
            begun: self.shared.begun.load(Ordering::SeqCst),
            committed: self.shared.committed.load(Ordering::SeqCst),
            rolled_back: self.shared.rolled_back.load(Ordering::SeqCst),
            open: self.shared.open.load(Ordering::SeqCst),
        }
    }

    fn check(&self, point: FailPoint) -> Result<(), LedgerError> {
        let mut fail_next = guard(&self.shared.fail_next);
        if *fail_next == Some(point) {
            *fail_next = None;
            return Err(LedgerError::store(MemoryStoreError::Injected(point)));
        }
        Ok(())
    }

    fn committed_balance(&self, account_number: AccountNumber) -> Option<i32> {
        guard(&self.shared.accounts)
            .get(&account_number)
            .map(|row| row.balance)
    }
}

impl AccountStore for InMemoryLedgerStore {
    type UnitOfWork = MemoryUnitOfWork;

    async fn create_account(&self, params: CreateAccountParams) -> Result<Account, LedgerError> {
        let mut accounts = guard(&self.shared.accounts);
        if accounts.contains_key(&params.account_number) {
            return Err(LedgerError::AlreadyExists(params.account_number));
        }
        accounts.insert(
            params.account_number,
            Row {
                balance: params.balance,
                lock: Arc::new(tokio::sync::Mutex::new(())),
            },
        );
        Ok(Account::from(params))
    }

    async fn find_account(
        &self,
        account_number: AccountNumber,
    ) -> Result<Option<Account>, LedgerError> {
        Ok(self
            .committed_balance(account_number)
            .map(|balance| Account {
                account_number,
                balance,
            }))
    }

    async fn get_account_and_lock(
        &self,
        account_number: AccountNumber,
        uow: &MemoryUnitOfWork,
    ) -> Result<Option<Account>, LedgerError> {
        self.check(FailPoint::Lock)?;

        {
            let state = guard(&uow.state);
            if state.held.contains_key(&account_number) {
                let balance = match state.balances.get(&account_number) {
                    Some(&pending) => Some(pending),
                    None => self.committed_balance(account_number),
                };
                return Ok(balance.map(|balance| Account {
                    account_number,
                    balance,
                }));
            }
        }

        let row_lock = match guard(&self.shared.accounts).get(&account_number) {
            Some(row) => Arc::clone(&row.lock),
            None => return Ok(None),
        };
        let held = row_lock.lock_owned().await;
        guard(&self.shared.lock_log).push(account_number);

        // Let concurrent units of work run into the lock.
        tokio::task::yield_now().await;

        let balance = self.committed_balance(account_number);
        guard(&uow.state).held.insert(account_number, held);
        Ok(balance.map(|balance| Account {
            account_number,
            balance,
        }))
    }

    async fn update_account_balance(
        &self,
        account_number: AccountNumber,
        balance: i32,
        uow: &MemoryUnitOfWork,
    ) -> Result<(), LedgerError> {
        self.check(FailPoint::UpdateBalance)?;
        let mut state = guard(&uow.state);
        if !state.held.contains_key(&account_number) {
            return Err(LedgerError::store(MemoryStoreError::NotLocked(account_number)));
        }
        state.balances.insert(account_number, balance);
        Ok(())
    }
}

impl TransactionStore for InMemoryLedgerStore {
    async fn begin(&self) -> Result<MemoryUnitOfWork, LedgerError> {
        self.check(FailPoint::Begin)?;
        self.shared.begun.fetch_add(1, Ordering::SeqCst);
        self.shared.open.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            state: Mutex::new(PendingState::default()),
        })
    }

    async fn insert_transaction(
        &self,
        record: NewTransactionRecord,
        uow: &MemoryUnitOfWork,
    ) -> Result<TransactionRecord, LedgerError> {
        self.check(FailPoint::InsertTransaction)?;
        let id = TransactionId(self.shared.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let persisted = record.persisted(id, Utc::now().naive_utc());
        guard(&uow.state).records.push(persisted);
        Ok(persisted)
    }

    async fn commit(&self, uow: MemoryUnitOfWork) -> Result<(), LedgerError> {
        self.check(FailPoint::Commit)?;

        let pending = std::mem::take(&mut *guard(&uow.state));
        {
            let mut accounts = guard(&self.shared.accounts);
            for (account_number, balance) in pending.balances {
                if let Some(row) = accounts.get_mut(&account_number) {
                    row.balance = balance;
                }
            }
        }
        guard(&self.shared.records).extend(pending.records);
        self.shared.committed.fetch_add(1, Ordering::SeqCst);

        // Row locks are released only after the writes are visible.
        drop(pending.held);
        Ok(())
    }

    async fn rollback(&self, uow: MemoryUnitOfWork) -> Result<(), LedgerError> {
        self.shared.rolled_back.fetch_add(1, Ordering::SeqCst);
        self.check(FailPoint::Rollback)?;
        drop(uow);
        Ok(())
    }

    async fn list_transactions(
        &self,
        account_number: AccountNumber,
        page: PageRequest,
    ) -> Result<PageResponse<TransactionRecord>, LedgerError> {
        let page = page.normalized();
        let mut matching: Vec<TransactionRecord> = guard(&self.shared.records)
            .iter()
            .filter(|record| record.account == account_number)
            .copied()
            .collect();
        matching.sort_by(|a, b| b.id.cmp(&a.id));

        let total = matching.len() as u64;
        let data = matching
            .into_iter()
            .skip(usize::try_from(page.offset()).unwrap_or(usize::MAX))
            .take(usize::try_from(page.limit()).unwrap_or(usize::MAX))
            .collect();
        Ok(PageResponse::new(data, page.page, page.per_page, total))
    }
}

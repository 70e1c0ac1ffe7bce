//! Property-based tests for the transaction engine.
//!
//! - Lock order: transfers always lock the lower account number first
//! - Ledger balance law: a transfer moves exactly `value` and conserves the total
//! - Sufficiency: a failed transfer changes nothing

use std::sync::Arc;

use ledger_shared::types::AccountNumber;
use proptest::prelude::*;

use super::account::CreateAccountParams;
use super::engine::{TransactionEngine, lock_order};
use super::error::LedgerError;
use super::memory::InMemoryLedgerStore;
use super::request::TransactionRequest;
use super::store::AccountStore;
use super::transaction::TransactionKind;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Strategy for two distinct account numbers.
fn distinct_pair() -> impl Strategy<Value = (i32, i32)> {
    (1i32..10_000, 1i32..10_000).prop_filter("accounts must differ", |(a, b)| a != b)
}

async fn seeded(accounts: &[(i32, i32)]) -> TransactionEngine<InMemoryLedgerStore> {
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

async fn balance_of(engine: &TransactionEngine<InMemoryLedgerStore>, number: i32) -> i32 {
    engine
        .store()
        .find_account(AccountNumber(number))
        .await
        .unwrap()
        .unwrap()
        .balance
}

proptest! {
    #[test]
    fn prop_lock_order_is_ascending_and_direction_free((a, b) in distinct_pair()) {
        let forward = lock_order(AccountNumber(a), AccountNumber(b));
        let backward = lock_order(AccountNumber(b), AccountNumber(a));
        prop_assert_eq!(forward, backward);
        prop_assert!(forward[0] < forward[1]);
    }

    #[test]
    fn prop_transfer_locks_lower_account_first(
        (from, to) in distinct_pair(),
        value in 1i32..=500,
    ) {
        let log = runtime().block_on(async {
            let engine = seeded(&[(from, 500), (to, 500)]).await;
            engine
                .execute(TransactionRequest::Transfer {
                    from: AccountNumber(from),
                    to: AccountNumber(to),
                    value,
                })
                .await
                .unwrap();
            engine.store().lock_log()
        });

        prop_assert_eq!(log, vec![AccountNumber(from.min(to)), AccountNumber(from.max(to))]);
    }

    #[test]
    fn prop_transfer_conserves_total(
        (from, to) in distinct_pair(),
        from_balance in 0i32..100_000,
        to_balance in 0i32..100_000,
        value in 1i32..100_000,
    ) {
        let (result, after_from, after_to, records) = runtime().block_on(async {
            let engine = seeded(&[(from, from_balance), (to, to_balance)]).await;
            let result = engine
                .execute(TransactionRequest::Transfer {
                    from: AccountNumber(from),
                    to: AccountNumber(to),
                    value,
                })
                .await;
            let after_from = balance_of(&engine, from).await;
            let after_to = balance_of(&engine, to).await;
            (result, after_from, after_to, engine.store().committed_records())
        });

        prop_assert_eq!(
            i64::from(after_from) + i64::from(after_to),
            i64::from(from_balance) + i64::from(to_balance)
        );

        if value <= from_balance {
            let legs = result.unwrap();
            prop_assert_eq!(after_from, from_balance - value);
            prop_assert_eq!(after_to, to_balance + value);
            prop_assert_eq!(legs.len(), 2);
            prop_assert_eq!(legs[0].kind, TransactionKind::Debit);
            prop_assert_eq!(legs[1].kind, TransactionKind::Credit);
            prop_assert_eq!(records.len(), 2);
        } else {
            prop_assert!(
                matches!(result, Err(LedgerError::InsufficientBalance { .. })),
                "expected InsufficientBalance, got {:?}",
                result
            );
            prop_assert_eq!(after_from, from_balance);
            prop_assert_eq!(after_to, to_balance);
            prop_assert!(records.is_empty());
        }
    }
}

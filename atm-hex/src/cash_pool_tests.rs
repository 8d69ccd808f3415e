//! CashPool unit tests: atomic movements, error precedence and rollback.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use atm_types::{
    Account, AccountId, AccountStore, AppError, CashPolicy, DenominationSet, DepositRequest,
    DispenseStrategy, Role, TransactionKind,
};

use crate::CashPool;
use crate::service_tests::tests::{MockRepo, deposit_request, notes};

async fn customer(repo: &MockRepo, mobile: &str) -> AccountId {
    let account = Account::new(
        "Asha".into(),
        format!("{mobile}@example.com"),
        mobile.into(),
        Role::Customer,
    )
    .unwrap();
    repo.create_account(account, "hash".into()).await.unwrap().id
}

async fn pool_with(repo: Arc<MockRepo>, strategy: DispenseStrategy) -> CashPool<MockRepo> {
    let policy = CashPolicy {
        denominations: DenominationSet::default(),
        strategy,
    };
    CashPool::load(repo, policy).await.unwrap()
}

#[tokio::test]
async fn test_deposit_then_greedy_withdraw() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Greedy).await;

    let balance = pool
        .deposit(account, deposit_request(&[(500, 1), (200, 2), (50, 2)]))
        .await
        .unwrap();
    assert_eq!(balance.amount(), 1000);

    let withdrawal = pool.withdraw(account, 700).await.unwrap();

    assert_eq!(withdrawal.balance.amount(), 300);
    assert_eq!(withdrawal.dispensed, notes(&[(500, 1), (200, 1)]));
    assert_eq!(pool.current_total().await.amount(), 300);
    assert_eq!(
        pool.current_inventory().await.without_zeros(),
        notes(&[(200, 1), (50, 2)])
    );
    assert_eq!(repo.saved_vault().unwrap(), pool.current_inventory().await);

    let kinds: Vec<_> = repo.recorded().iter().map(|t| t.kind).collect();
    assert_eq!(kinds, vec![TransactionKind::Deposit, TransactionKind::Withdraw]);
}

#[tokio::test]
async fn test_empty_pool_deposit_then_greedy_withdraw_150() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo, DispenseStrategy::Greedy).await;

    let balance = pool
        .deposit(account, deposit_request(&[(100, 2), (50, 1)]))
        .await
        .unwrap();
    assert_eq!(balance.amount(), 250);

    let withdrawal = pool.withdraw(account, 150).await.unwrap();

    assert_eq!(withdrawal.balance.amount(), 100);
    assert_eq!(withdrawal.dispensed, notes(&[(100, 1), (50, 1)]));
    let inventory = pool.current_inventory().await;
    assert_eq!(inventory.count(atm_types::Denomination::new(100).unwrap()), 1);
    assert_eq!(inventory.count(atm_types::Denomination::new(50).unwrap()), 0);
}

#[tokio::test]
async fn test_deposit_withdraw_round_trip() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    repo.adjust_balance(account, 300).await.unwrap();
    let pool = pool_with(repo, DispenseStrategy::Exact).await;
    let total_before = pool.current_total().await;

    pool.deposit(account, deposit_request(&[(200, 1), (50, 2)]))
        .await
        .unwrap();
    let withdrawal = pool.withdraw(account, 300).await.unwrap();

    assert_eq!(withdrawal.balance.amount(), 300);
    assert_eq!(pool.current_total().await, total_before);
    assert!(pool.reconcile().await.unwrap().consistent);
}

#[tokio::test]
async fn test_exact_finds_combination_greedy_misses() {
    let repo = Arc::new(MockRepo::with_vault(notes(&[(500, 1), (200, 3)])));
    let account = customer(&repo, "9876543210").await;
    repo.adjust_balance(account, 1000).await.unwrap();

    let greedy = pool_with(repo.clone(), DispenseStrategy::Greedy).await;
    let result = greedy.withdraw(account, 600).await;
    assert!(matches!(result, Err(AppError::InsufficientCash { .. })));

    let exact = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    let withdrawal = exact.withdraw(account, 600).await.unwrap();
    assert_eq!(withdrawal.dispensed, notes(&[(200, 3)]));
}

#[tokio::test]
async fn test_invalid_deposit_changes_nothing() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;

    let mismatch = DepositRequest {
        amount: 300,
        denominations: notes(&[(100, 2)]),
    };
    let foreign = DepositRequest {
        amount: 20,
        denominations: notes(&[(20, 1)]),
    };
    let negative = DepositRequest {
        amount: -100,
        denominations: notes(&[(100, 1)]),
    };

    for req in [mismatch, foreign, negative] {
        let result = pool.deposit(account, req).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    assert_eq!(pool.current_balance(account).await.unwrap().amount(), 0);
    assert_eq!(pool.current_total().await.amount(), 0);
    assert!(repo.saved_vault().is_none());
    assert!(repo.recorded().is_empty());
}

#[tokio::test]
async fn test_withdraw_rejects_non_positive_amount() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo, DispenseStrategy::Exact).await;

    assert!(matches!(
        pool.withdraw(account, 0).await,
        Err(AppError::Validation(_))
    ));
}

#[tokio::test]
async fn test_insufficient_funds_takes_precedence() {
    // The machine is empty and the account is poor: funds are reported first.
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo, DispenseStrategy::Exact).await;

    let result = pool.withdraw(account, 100).await;

    match result {
        Err(AppError::InsufficientFunds {
            available,
            requested,
        }) => {
            assert_eq!(available, 0);
            assert_eq!(requested, 100);
        }
        other => panic!("Expected insufficient funds, got {:?}", other),
    }
}

#[tokio::test]
async fn test_insufficient_cash_leaves_state_unchanged() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    pool.deposit(account, deposit_request(&[(500, 1)]))
        .await
        .unwrap();

    let result = pool.withdraw(account, 200).await;

    assert!(matches!(
        result,
        Err(AppError::InsufficientCash {
            requested: 200,
            available: 500
        })
    ));
    assert_eq!(pool.current_balance(account).await.unwrap().amount(), 500);
    assert_eq!(pool.current_inventory().await.without_zeros(), notes(&[(500, 1)]));
    assert_eq!(repo.recorded().len(), 1);
}

#[tokio::test]
async fn test_ledger_failure_does_not_undo_movement() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    repo.fail_ledger.store(true, Ordering::SeqCst);

    let balance = pool
        .deposit(account, deposit_request(&[(100, 3)]))
        .await
        .unwrap();

    assert_eq!(balance.amount(), 300);
    assert_eq!(pool.current_total().await.amount(), 300);
    assert!(repo.recorded().is_empty());
}

#[tokio::test]
async fn test_vault_failure_rolls_back_balance() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    pool.deposit(account, deposit_request(&[(200, 2)]))
        .await
        .unwrap();
    repo.fail_vault.store(true, Ordering::SeqCst);

    let deposit = pool.deposit(account, deposit_request(&[(100, 1)])).await;
    let withdrawal = pool.withdraw(account, 200).await;

    assert!(matches!(deposit, Err(AppError::Internal(_))));
    assert!(matches!(withdrawal, Err(AppError::Internal(_))));
    assert_eq!(pool.current_balance(account).await.unwrap().amount(), 400);
    assert_eq!(pool.current_inventory().await.without_zeros(), notes(&[(200, 2)]));
    assert_eq!(repo.recorded().len(), 1);
}

#[tokio::test]
async fn test_load_cash_does_not_credit_accounts() {
    let repo = Arc::new(MockRepo::new());
    let admin = customer(&repo, "9000000000").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;

    let total = pool
        .load_cash(admin, deposit_request(&[(500, 4), (50, 10)]))
        .await
        .unwrap();
    let again = pool
        .load_cash(admin, deposit_request(&[(100, 5)]))
        .await
        .unwrap();

    assert_eq!(total.amount(), 2500);
    assert_eq!(again.amount(), 3000);
    assert_eq!(pool.current_balance(admin).await.unwrap().amount(), 0);
    assert!(
        repo.recorded()
            .iter()
            .all(|t| t.kind == TransactionKind::CashLoad)
    );
}

#[tokio::test]
async fn test_load_restores_saved_inventory() {
    let repo = Arc::new(MockRepo::with_vault(notes(&[(500, 2), (100, 3)])));

    let pool = pool_with(repo, DispenseStrategy::Exact).await;

    assert_eq!(pool.current_total().await.amount(), 1300);
    assert!(pool.reconcile().await.unwrap().consistent);
}

#[tokio::test]
async fn test_load_rejects_foreign_denomination() {
    let repo = Arc::new(MockRepo::with_vault(notes(&[(2000, 1)])));

    let result = CashPool::load(repo, CashPolicy::default()).await;

    assert!(matches!(result, Err(AppError::Validation(_))));
}

#[tokio::test]
async fn test_reconcile_detects_tampered_vault() {
    let repo = Arc::new(MockRepo::new());
    let admin = customer(&repo, "9000000000").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;

    assert!(pool.reconcile().await.unwrap().consistent);

    pool.load_cash(admin, deposit_request(&[(200, 5)]))
        .await
        .unwrap();
    assert!(pool.reconcile().await.unwrap().consistent);

    repo.tamper_vault(notes(&[(200, 4)]));
    let report = pool.reconcile().await.unwrap();

    assert!(!report.consistent);
    assert_eq!(report.computed_total, 1000);
    assert_eq!(report.persisted_total, Some(800));
    // Reconciliation never repairs either side.
    assert_eq!(pool.current_total().await.amount(), 1000);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_movements_conserve_cash() {
    let repo = Arc::new(MockRepo::new());
    let admin = customer(&repo, "9000000000").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    pool.load_cash(admin, deposit_request(&[(100, 20)]))
        .await
        .unwrap();

    let mut accounts = Vec::new();
    for i in 0..8 {
        let account = customer(&repo, &format!("98765432{i:02}")).await;
        accounts.push(account);
    }

    let mut handles = Vec::new();
    for account in accounts.iter().copied() {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            pool.deposit(account, deposit_request(&[(100, 3)]))
                .await
                .unwrap();
            // Each account tries to take out more than it put in once.
            let _ = pool.withdraw(account, 400).await;
            pool.withdraw(account, 200).await.unwrap();
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut balances = 0;
    for account in &accounts {
        balances += pool.current_balance(*account).await.unwrap().amount();
    }

    // 2000 loaded + 8 × 300 deposited − 8 × 200 withdrawn.
    assert_eq!(balances, 8 * 100);
    assert_eq!(pool.current_total().await.amount(), 2000 + 8 * 100);
    assert!(pool.reconcile().await.unwrap().consistent);
}

#[tokio::test]
async fn test_dropped_deposit_runs_to_completion() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    let gate = repo.hold_next_vault_write();

    // The caller gives up while the movement is between the balance update
    // and the vault write.
    tokio::select! {
        _ = pool.deposit(account, deposit_request(&[(500, 1), (100, 2)])) => {
            panic!("deposit finished while the vault write was held");
        }
        _ = gate.entered.notified() => {}
    }
    gate.release.notify_one();

    let inventory = pool.current_inventory().await;
    assert_eq!(inventory.without_zeros(), notes(&[(500, 1), (100, 2)]));
    assert_eq!(pool.current_balance(account).await.unwrap().amount(), 700);
    assert_eq!(repo.saved_vault().unwrap(), inventory);
    assert!(pool.reconcile().await.unwrap().consistent);
}

#[tokio::test]
async fn test_timed_out_withdrawal_runs_to_completion() {
    let repo = Arc::new(MockRepo::new());
    let account = customer(&repo, "9876543210").await;
    let pool = pool_with(repo.clone(), DispenseStrategy::Exact).await;
    pool.deposit(account, deposit_request(&[(500, 1), (100, 2)]))
        .await
        .unwrap();
    let gate = repo.hold_next_vault_write();

    let result = tokio::time::timeout(
        std::time::Duration::from_millis(20),
        pool.withdraw(account, 600),
    )
    .await;
    assert!(result.is_err());

    gate.entered.notified().await;
    gate.release.notify_one();

    let inventory = pool.current_inventory().await;
    assert_eq!(inventory.without_zeros(), notes(&[(100, 1)]));
    assert_eq!(pool.current_balance(account).await.unwrap().amount(), 100);
    assert_eq!(repo.saved_vault().unwrap(), inventory);
    assert!(pool.reconcile().await.unwrap().consistent);
}

//! 钱包服务集成测试
//! 覆盖：惰性建档、估值组合、并发出账安全、货币校验、错误传播

mod common;

use std::sync::Arc;

use common::{currency, wallet_service, ScriptedRateSource};
use fiatvault::{
    domain::Money,
    repository::WalletStore,
    service::WalletError,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

#[tokio::test]
async fn test_fresh_user_gets_zero_reference_wallet() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);

    let snapshot = service.get_snapshot(Uuid::new_v4()).await.unwrap();

    assert_eq!(snapshot.wallet.balances.len(), 1);
    assert!(snapshot.wallet.balances[&currency("PLN")].is_zero());
    assert!(snapshot.valuation.values[&currency("PLN")].is_zero());
    assert!(snapshot.valuation.total.is_zero());
}

#[tokio::test]
async fn test_deposit_revalues_in_reference_currency() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    service
        .deposit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();
    let snapshot = service
        .deposit(user, &currency("USD"), Money::new(dec!(50.00)))
        .await
        .unwrap();

    assert_eq!(snapshot.wallet.balances[&currency("EUR")].amount(), dec!(100.00));
    assert_eq!(snapshot.wallet.balances[&currency("USD")].amount(), dec!(50.00));
    assert_eq!(snapshot.valuation.values[&currency("EUR")].amount(), dec!(450.00));
    assert_eq!(snapshot.valuation.values[&currency("USD")].amount(), dec!(200.00));
    assert_eq!(snapshot.valuation.total.amount(), dec!(650.00));
}

#[tokio::test]
async fn test_deposit_then_withdraw_round_trips_exactly() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    let before = service.get_snapshot(user).await.unwrap();
    service
        .deposit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();
    let after = service
        .withdraw(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();

    // 无任何舍入漂移
    assert!(after.wallet.balances[&currency("EUR")].is_zero());
    assert_eq!(after.valuation.total, before.valuation.total);
}

#[tokio::test]
async fn test_unknown_currency_rejected_before_mutation() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, store) = wallet_service(source);
    let user = Uuid::new_v4();

    let err = service
        .deposit(user, &currency("GBP"), Money::new(dec!(10.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidCurrency(_)));

    // 存储未被触碰：只有惰性建档出来的参考货币零余额
    let wallet = store.get_or_create(user, &currency("PLN")).await.unwrap();
    assert!(!wallet.balances.contains_key(&currency("GBP")));
    assert!(wallet.balances.values().all(|m| m.is_zero()));
}

#[tokio::test]
async fn test_reference_currency_needs_no_rate_entry() {
    // PLN 不在汇率表里，但作为参考货币恒有效
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    let snapshot = service
        .deposit(user, &currency("PLN"), Money::new(dec!(25.00)))
        .await
        .unwrap();
    assert_eq!(snapshot.wallet.balances[&currency("PLN")].amount(), dec!(25.00));
    assert_eq!(snapshot.valuation.total.amount(), dec!(25.00));
}

#[tokio::test]
async fn test_non_positive_amounts_rejected() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    let err = service
        .deposit(user, &currency("EUR"), Money::zero())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));

    let err = service
        .withdraw(user, &currency("EUR"), Money::zero())
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InvalidAmount(_)));
}

#[tokio::test]
async fn test_overdraft_rejected_and_balance_untouched() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    service
        .deposit(user, &currency("USD"), Money::new(dec!(5.00)))
        .await
        .unwrap();
    let err = service
        .withdraw(user, &currency("USD"), Money::new(dec!(10.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, WalletError::InsufficientFunds(_)));

    let snapshot = service.get_snapshot(user).await.unwrap();
    assert_eq!(snapshot.wallet.balances[&currency("USD")].amount(), dec!(5.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_debits_cannot_both_succeed() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    service
        .deposit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();

    // 预热汇率缓存后并发两笔 60.00 出账
    let a = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .withdraw(user, &currency("EUR"), Money::new(dec!(60.00)))
                .await
        })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move {
            service
                .withdraw(user, &currency("EUR"), Money::new(dec!(60.00)))
                .await
        })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let insufficient = results
        .iter()
        .filter(|r| matches!(r, Err(WalletError::InsufficientFunds(_))))
        .count();

    assert_eq!(successes, 1, "exactly one concurrent debit may win");
    assert_eq!(insufficient, 1);

    let snapshot = service.get_snapshot(user).await.unwrap();
    assert_eq!(snapshot.wallet.balances[&currency("EUR")].amount(), dec!(40.00));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_credits_are_not_lost() {
    let source = Arc::new(ScriptedRateSource::with_default_rates());
    let (service, _store) = wallet_service(source);
    let user = Uuid::new_v4();

    let tasks: Vec<_> = (0..20)
        .map(|_| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .deposit(user, &currency("USD"), Money::new(dec!(1.00)))
                    .await
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snapshot = service.get_snapshot(user).await.unwrap();
    assert_eq!(snapshot.wallet.balances[&currency("USD")].amount(), dec!(20.00));
}

#[tokio::test]
async fn test_rate_failure_propagates_as_unavailable() {
    let source = Arc::new(ScriptedRateSource::failing());
    let (service, _store) = wallet_service(source);

    let err = service.get_snapshot(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, WalletError::RatesUnavailable));
}

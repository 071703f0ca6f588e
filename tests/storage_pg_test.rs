//! Postgres 余额存储与认证集成测试（需要真实数据库）
//!
//! 运行方式：
//! ```bash
//! TEST_DATABASE_URL=postgres://... cargo test --test storage_pg_test -- --ignored
//! ```

mod common;

use std::sync::Arc;

use common::currency;
use fiatvault::{
    domain::Money,
    infrastructure::password::Password,
    repository::{users, PgWalletStore, StoreError, WalletStore},
    service,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

async fn test_pool() -> sqlx::PgPool {
    let database_url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| "postgres://localhost:5432/fiatvault_test".into());

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to create test database pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    pool
}

#[tokio::test]
#[ignore]
async fn test_pg_store_credit_debit_round_trip() {
    let pool = test_pool().await;
    let store = PgWalletStore::new(pool);
    let user = Uuid::new_v4();

    let wallet = store.get_or_create(user, &currency("PLN")).await.unwrap();
    assert!(wallet.balance(&currency("PLN")).is_zero());

    store
        .credit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();
    let wallet = store
        .debit(user, &currency("EUR"), Money::new(dec!(40.00)))
        .await
        .unwrap();
    assert_eq!(wallet.balance(&currency("EUR")).amount(), dec!(60.00));

    let err = store
        .debit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::InsufficientFunds(_)));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_pg_store_concurrent_debits() {
    let pool = test_pool().await;
    let store = Arc::new(PgWalletStore::new(pool));
    let user = Uuid::new_v4();

    store
        .credit(user, &currency("EUR"), Money::new(dec!(100.00)))
        .await
        .unwrap();

    let a = {
        let store = store.clone();
        tokio::spawn(
            async move { store.debit(user, &currency("EUR"), Money::new(dec!(60.00))).await },
        )
    };
    let b = {
        let store = store.clone();
        tokio::spawn(
            async move { store.debit(user, &currency("EUR"), Money::new(dec!(60.00))).await },
        )
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);

    let wallet = store.get_or_create(user, &currency("PLN")).await.unwrap();
    assert_eq!(wallet.balance(&currency("EUR")).amount(), dec!(40.00));
}

#[tokio::test]
#[ignore]
async fn test_register_and_login_round_trip() {
    std::env::set_var(
        "JWT_SECRET",
        "integration_test_secret_at_least_32_chars_long",
    );
    let pool = test_pool().await;
    let email = format!("user-{}@example.com", Uuid::new_v4());
    let password = Password::new("wallet_pass_123".into());

    let registered = service::auth::register(&pool, &email, &password)
        .await
        .unwrap();
    assert!(!registered.access_token.is_empty());

    // 重复注册被拒绝
    assert!(service::auth::register(&pool, &email, &password)
        .await
        .is_err());

    let logged_in = service::auth::login(&pool, &email, &password).await.unwrap();
    assert_eq!(logged_in.user_id, registered.user_id);

    let stored = users::get_by_id(&pool, registered.user_id)
        .await
        .unwrap()
        .expect("registered user should be readable by id");
    assert_eq!(stored.email, email);

    let wrong = Password::new("wrong_password_1".into());
    assert!(service::auth::login(&pool, &email, &wrong).await.is_err());
}

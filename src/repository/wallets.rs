//! 钱包余额 Repository（PostgreSQL/CockroachDB）
//! 出账使用数据库级条件更新：检查与扣减在同一条 UPDATE 内完成

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    domain::{CurrencyCode, Money, Wallet},
    infrastructure::db::PgPool,
    repository::wallet_store::{StoreError, WalletStore},
};

pub struct PgWalletStore {
    pool: PgPool,
}

#[derive(Debug, FromRow)]
struct BalanceRow {
    currency: String,
    balance: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl PgWalletStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 按用户加载全部余额行并装配钱包
    async fn load_wallet(&self, user_id: Uuid) -> Result<Wallet, StoreError> {
        let rows: Vec<BalanceRow> = sqlx::query_as(
            r#"
            SELECT currency, balance, created_at, updated_at
            FROM wallet_balances
            WHERE user_id = $1
            ORDER BY currency
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        if rows.is_empty() {
            return Ok(Wallet::empty(user_id));
        }

        let mut balances = BTreeMap::new();
        let mut created_at = rows[0].created_at;
        let mut updated_at = rows[0].updated_at;

        for row in rows {
            created_at = created_at.min(row.created_at);
            updated_at = updated_at.max(row.updated_at);
            let currency = CurrencyCode::parse(&row.currency)
                .map_err(|e| StoreError::Unavailable(format!("corrupt currency column: {e}")))?;
            balances.insert(currency, Money::new(row.balance));
        }

        Ok(Wallet {
            user_id,
            balances,
            created_at,
            updated_at,
        })
    }
}

#[async_trait]
impl WalletStore for PgWalletStore {
    async fn get_or_create(
        &self,
        user_id: Uuid,
        reference: &CurrencyCode,
    ) -> Result<Wallet, StoreError> {
        // 惰性建档：以参考货币零余额落一行，已存在则不动
        sqlx::query(
            r#"
            INSERT INTO wallet_balances (user_id, currency, balance)
            VALUES ($1, $2, 0)
            ON CONFLICT (user_id, currency) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(reference.as_str())
        .execute(&self.pool)
        .await?;

        self.load_wallet(user_id).await
    }

    async fn credit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError> {
        sqlx::query(
            r#"
            INSERT INTO wallet_balances (user_id, currency, balance)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, currency)
            DO UPDATE SET balance = wallet_balances.balance + EXCLUDED.balance,
                          updated_at = now()
            "#,
        )
        .bind(user_id)
        .bind(currency.as_str())
        .bind(amount.amount())
        .execute(&self.pool)
        .await?;

        self.load_wallet(user_id).await
    }

    async fn debit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError> {
        // 守卫条件写进 WHERE：余额不足时零行命中，扣减不会部分生效
        let result = sqlx::query(
            r#"
            UPDATE wallet_balances
            SET balance = balance - $3, updated_at = now()
            WHERE user_id = $1 AND currency = $2 AND balance >= $3
            "#,
        )
        .bind(user_id)
        .bind(currency.as_str())
        .bind(amount.amount())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::InsufficientFunds(currency.clone()));
        }

        self.load_wallet(user_id).await
    }
}

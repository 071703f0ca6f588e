//! 内存余额存储
//! 语义与 PgWalletStore 对齐：dashmap 的 entry 守卫把检查与扣减锁在同一分片内，
//! 不同 (user, currency) 键互不阻塞。用于测试与无数据库环境联调。

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    domain::{CurrencyCode, Money, Wallet},
    repository::wallet_store::{StoreError, WalletStore},
};

#[derive(Debug, Clone)]
struct BalanceCell {
    amount: Decimal,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BalanceCell {
    fn new(amount: Decimal) -> Self {
        let now = Utc::now();
        Self {
            amount,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Default)]
pub struct MemoryWalletStore {
    balances: DashMap<(Uuid, CurrencyCode), BalanceCell>,
}

impl MemoryWalletStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, user_id: Uuid) -> Wallet {
        let mut balances = BTreeMap::new();
        let mut created_at: Option<DateTime<Utc>> = None;
        let mut updated_at: Option<DateTime<Utc>> = None;

        for entry in self.balances.iter() {
            let (owner, currency) = entry.key();
            if *owner != user_id {
                continue;
            }
            let cell = entry.value();
            created_at = Some(created_at.map_or(cell.created_at, |t| t.min(cell.created_at)));
            updated_at = Some(updated_at.map_or(cell.updated_at, |t| t.max(cell.updated_at)));
            balances.insert(currency.clone(), Money::new(cell.amount));
        }

        let mut wallet = Wallet::empty(user_id);
        if let (Some(created), Some(updated)) = (created_at, updated_at) {
            wallet.created_at = created;
            wallet.updated_at = updated;
        }
        wallet.balances = balances;
        wallet
    }
}

#[async_trait]
impl WalletStore for MemoryWalletStore {
    async fn get_or_create(
        &self,
        user_id: Uuid,
        reference: &CurrencyCode,
    ) -> Result<Wallet, StoreError> {
        self.balances
            .entry((user_id, reference.clone()))
            .or_insert_with(|| BalanceCell::new(Decimal::ZERO));
        Ok(self.collect(user_id))
    }

    async fn credit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError> {
        match self.balances.entry((user_id, currency.clone())) {
            Entry::Occupied(mut occupied) => {
                let cell = occupied.get_mut();
                cell.amount += amount.amount();
                cell.updated_at = Utc::now();
            }
            Entry::Vacant(vacant) => {
                vacant.insert(BalanceCell::new(amount.amount()));
            }
        }
        Ok(self.collect(user_id))
    }

    async fn debit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError> {
        // entry 守卫持有键所在分片的写锁，检查与扣减之间不存在可见的中间态
        match self.balances.entry((user_id, currency.clone())) {
            Entry::Occupied(mut occupied) if occupied.get().amount >= amount.amount() => {
                let cell = occupied.get_mut();
                cell.amount -= amount.amount();
                cell.updated_at = Utc::now();
            }
            _ => return Err(StoreError::InsufficientFunds(currency.clone())),
        }
        Ok(self.collect(user_id))
    }
}

//! 钱包聚合：单个用户按货币划分的余额

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{CurrencyCode, Money};

/// 余额不变式：任何条目的金额永不为负；缺失条目视为零余额。
/// 钱包状态仅由余额存储层持有和变更。
#[derive(Debug, Clone, Serialize)]
pub struct Wallet {
    pub user_id: Uuid,
    pub balances: BTreeMap<CurrencyCode, Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn empty(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            balances: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn balance(&self, currency: &CurrencyCode) -> Money {
        self.balances.get(currency).copied().unwrap_or_else(Money::zero)
    }
}

//! 钱包服务层
//! 编排入口操作：校验货币 → 原子变更余额 → 按当前汇率重新估值
//! 服务自身不持有跨调用状态

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    domain::{value_in_reference, CurrencyCode, Money, Valuation, Wallet},
    repository::{StoreError, WalletStore},
    service::exchange_service::{ExchangeError, ExchangeRateService},
};

#[derive(Debug, Error)]
pub enum WalletError {
    /// 调用方错误：金额不合法
    #[error("invalid amount: {0}")]
    InvalidAmount(String),
    /// 调用方错误：货币不在当前汇率表中且非参考货币
    #[error("invalid currency: {0}")]
    InvalidCurrency(String),
    /// 调用方错误：余额不足，出账被拒绝且余额未变
    #[error("insufficient funds in {0}")]
    InsufficientFunds(String),
    /// 基础设施瞬态错误，可带退避重试
    #[error("exchange rate service temporarily unavailable")]
    RatesUnavailable,
    #[error("wallet storage unavailable: {0}")]
    Storage(String),
}

impl From<StoreError> for WalletError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::InsufficientFunds(currency) => {
                WalletError::InsufficientFunds(currency.to_string())
            }
            StoreError::Unavailable(msg) => WalletError::Storage(msg),
        }
    }
}

impl From<ExchangeError> for WalletError {
    fn from(_: ExchangeError) -> Self {
        WalletError::RatesUnavailable
    }
}

/// 组合结果：原始余额 + 参考货币估值
#[derive(Debug, Clone)]
pub struct WalletSnapshot {
    pub wallet: Wallet,
    pub valuation: Valuation,
}

pub struct WalletService {
    store: Arc<dyn WalletStore>,
    exchange: Arc<ExchangeRateService>,
    reference_currency: CurrencyCode,
}

impl WalletService {
    pub fn new(
        store: Arc<dyn WalletStore>,
        exchange: Arc<ExchangeRateService>,
        reference_currency: CurrencyCode,
    ) -> Self {
        Self {
            store,
            exchange,
            reference_currency,
        }
    }

    pub fn reference_currency(&self) -> &CurrencyCode {
        &self.reference_currency
    }

    /// 读取快照；从未交易过的用户在此惰性建档（参考货币零余额）
    pub async fn get_snapshot(&self, user_id: Uuid) -> Result<WalletSnapshot, WalletError> {
        let wallet = self
            .store
            .get_or_create(user_id, &self.reference_currency)
            .await?;
        self.revalue(wallet).await
    }

    pub async fn deposit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<WalletSnapshot, WalletError> {
        self.ensure_positive(amount)?;
        self.validate_currency(currency).await?;

        self.store.credit(user_id, currency, amount).await?;
        tracing::info!(%user_id, %currency, %amount, "deposit applied");

        // 变更后重读并重新估值；变更与估值之间的微小汇率漂移是接受的
        self.get_snapshot(user_id).await
    }

    pub async fn withdraw(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<WalletSnapshot, WalletError> {
        self.ensure_positive(amount)?;
        self.validate_currency(currency).await?;

        self.store.debit(user_id, currency, amount).await?;
        tracing::info!(%user_id, %currency, %amount, "withdrawal applied");

        self.get_snapshot(user_id).await
    }

    /// 货币有效性策略：参考货币恒有效，其余必须出现在当前汇率表
    async fn validate_currency(&self, currency: &CurrencyCode) -> Result<(), WalletError> {
        if *currency == self.reference_currency {
            return Ok(());
        }
        let table = self.exchange.get_rates().await?;
        if !table.contains(currency) {
            return Err(WalletError::InvalidCurrency(currency.to_string()));
        }
        Ok(())
    }

    fn ensure_positive(&self, amount: Money) -> Result<(), WalletError> {
        if !amount.is_positive() {
            return Err(WalletError::InvalidAmount(
                "amount must be a positive value".into(),
            ));
        }
        Ok(())
    }

    async fn revalue(&self, wallet: Wallet) -> Result<WalletSnapshot, WalletError> {
        let table = self.exchange.get_rates().await?;
        let valuation = value_in_reference(&wallet.balances, &table.rates, &self.reference_currency);
        Ok(WalletSnapshot { wallet, valuation })
    }
}

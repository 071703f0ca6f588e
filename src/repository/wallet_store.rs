//! 余额存储抽象
//! 唯一允许变更钱包余额的层；所有变更针对单个 (user, currency) 原子生效

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{CurrencyCode, Money, Wallet};

#[derive(Debug, Error)]
pub enum StoreError {
    /// 出账前置条件（余额充足）在原子步骤内不成立，余额保持不变
    #[error("insufficient funds in {0}")]
    InsufficientFunds(CurrencyCode),
    #[error("wallet storage unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// 并发约束：
/// - 不同 (user, currency) 的操作互不阻塞
/// - 相同 (user, currency) 的并发操作表现为某个合法的全序
///   （由存储层的原子条件更新保证，而非应用层读-查-写）
#[async_trait]
pub trait WalletStore: Send + Sync {
    /// 读取钱包，不存在则显式创建：新钱包以参考货币的零余额入账
    async fn get_or_create(
        &self,
        user_id: Uuid,
        reference: &CurrencyCode,
    ) -> Result<Wallet, StoreError>;

    /// 入账。amount 已在上游校验为严格正值；条目缺失时从零创建。
    /// 本设计不设余额上限，入账总是成功。
    async fn credit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError>;

    /// 条件出账：check-and-decrement 作为单一不可分步骤执行。
    /// 两笔并发出账合计超过可用余额时绝不会同时成功。
    async fn debit(
        &self,
        user_id: Uuid,
        currency: &CurrencyCode,
        amount: Money,
    ) -> Result<Wallet, StoreError>;
}

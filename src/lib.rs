//! FiatVault - 多币种钱包账本服务后端
//!
//! 核心：并发安全的余额引擎（存储级原子条件出账）
//! + TTL/single-flight 汇率缓存 + 参考货币估值

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod error_body;
pub mod infrastructure;
pub mod metrics;
pub mod repository;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{AppError, AppErrorCode};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        domain::{CurrencyCode, Money, Wallet},
        error::{AppError, AppErrorCode},
        service::{WalletError, WalletService, WalletSnapshot},
    };
}

pub mod auth;
pub mod exchange_service;
pub mod wallet_service;

pub use exchange_service::{ExchangeError, ExchangeRateService, HttpRateSource, RateSource, RateTable};
pub use wallet_service::{WalletError, WalletService, WalletSnapshot};

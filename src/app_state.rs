//! 应用状态
//! 启动时构造一次的共享资源，随路由向下传递

use std::{sync::Arc, time::Duration};

use crate::{
    config::Config,
    domain::CurrencyCode,
    infrastructure::db::PgPool,
    repository::{PgWalletStore, WalletStore},
    service::{
        exchange_service::{ExchangeRateService, HttpRateSource, RateSource},
        wallet_service::WalletService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub exchange: Arc<ExchangeRateService>,
    pub wallet_service: Arc<WalletService>,
}

impl AppState {
    /// 生产装配：Postgres 余额存储 + HTTP 汇率源
    pub fn new(pool: PgPool, config: Arc<Config>) -> anyhow::Result<Self> {
        let source = Arc::new(HttpRateSource::new(
            &config.exchange.base_url,
            Duration::from_secs(config.exchange.fetch_timeout_secs),
        )?);
        let store = Arc::new(PgWalletStore::new(pool.clone()));
        Self::with_components(pool, config, store, source)
    }

    /// 注入式装配：测试与联调可替换余额存储或汇率源
    pub fn with_components(
        pool: PgPool,
        config: Arc<Config>,
        store: Arc<dyn WalletStore>,
        source: Arc<dyn RateSource>,
    ) -> anyhow::Result<Self> {
        let exchange = Arc::new(ExchangeRateService::new(
            source,
            Duration::from_secs(config.exchange.cache_ttl_secs),
            config.exchange.serve_stale_rates,
        ));

        let reference = CurrencyCode::parse(&config.exchange.reference_currency)
            .map_err(|e| anyhow::anyhow!("invalid reference currency in config: {e}"))?;
        let wallet_service = Arc::new(WalletService::new(store, exchange.clone(), reference));

        Ok(Self {
            pool,
            config,
            exchange,
            wallet_service,
        })
    }
}

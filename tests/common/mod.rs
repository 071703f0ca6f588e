//! 集成测试共用组件
#![allow(dead_code)]

use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use fiatvault::{
    domain::CurrencyCode,
    repository::MemoryWalletStore,
    service::{ExchangeError, ExchangeRateService, RateSource, WalletService},
};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub fn currency(code: &str) -> CurrencyCode {
    CurrencyCode::parse(code).unwrap()
}

/// 可编程汇率源：统计抓取次数，可注入失败与延迟
pub struct ScriptedRateSource {
    rates: BTreeMap<CurrencyCode, Decimal>,
    fetch_count: AtomicUsize,
    fail: AtomicBool,
    delay: Option<Duration>,
}

impl ScriptedRateSource {
    pub fn new(rates: BTreeMap<CurrencyCode, Decimal>) -> Self {
        Self {
            rates,
            fetch_count: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            delay: None,
        }
    }

    /// EUR=4.50, USD=4.00 的标准测试汇率表
    pub fn with_default_rates() -> Self {
        let mut rates = BTreeMap::new();
        rates.insert(currency("EUR"), dec!(4.50));
        rates.insert(currency("USD"), dec!(4.00));
        Self::new(rates)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn failing() -> Self {
        let source = Self::new(BTreeMap::new());
        source.fail.store(true, Ordering::SeqCst);
        source
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn fetches(&self) -> usize {
        self.fetch_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RateSource for ScriptedRateSource {
    async fn fetch(&self) -> Result<BTreeMap<CurrencyCode, Decimal>, ExchangeError> {
        self.fetch_count.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ExchangeError::Unavailable("scripted failure".into()));
        }
        Ok(self.rates.clone())
    }
}

pub fn exchange_with(
    source: Arc<ScriptedRateSource>,
    ttl: Duration,
    serve_stale: bool,
) -> Arc<ExchangeRateService> {
    Arc::new(ExchangeRateService::new(source, ttl, serve_stale))
}

/// 标准测试装配：内存余额存储 + 脚本汇率源，参考货币 PLN
pub fn wallet_service(source: Arc<ScriptedRateSource>) -> (Arc<WalletService>, Arc<MemoryWalletStore>) {
    let store = Arc::new(MemoryWalletStore::new());
    let exchange = exchange_with(source, Duration::from_secs(1800), false);
    let service = Arc::new(WalletService::new(
        store.clone(),
        exchange,
        currency("PLN"),
    ));
    (service, store)
}

//! 汇率服务
//! TTL 缓存 + single-flight 刷新去重；远端为 NBP 风格的汇率表接口

use std::{collections::BTreeMap, sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::domain::{CurrencyCode, Money};

#[derive(Debug, Error)]
pub enum ExchangeError {
    #[error("exchange rate source unavailable: {0}")]
    Unavailable(String),
}

/// 整表替换式的汇率快照
///
/// rate 的口径：1 单位外币折合参考货币的数量，
/// 即 amount_in_reference = amount * rate。
#[derive(Debug, Clone)]
pub struct RateTable {
    pub rates: BTreeMap<CurrencyCode, Decimal>,
    pub fetched_at: DateTime<Utc>,
}

impl RateTable {
    pub fn contains(&self, currency: &CurrencyCode) -> bool {
        self.rates.contains_key(currency)
    }

    fn age(&self) -> chrono::Duration {
        Utc::now() - self.fetched_at
    }
}

/// 远端汇率源：一次幂等读取，失败统一折叠为 Unavailable
#[async_trait]
pub trait RateSource: Send + Sync {
    async fn fetch(&self) -> Result<BTreeMap<CurrencyCode, Decimal>, ExchangeError>;
}

/// HTTP 汇率源
/// 响应包络（NBP C 表）：[ { "rates": [ { "code": "USD", "ask": 4.02 }, ... ] } ]
pub struct HttpRateSource {
    client: reqwest::Client,
    url: String,
}

#[derive(Debug, Deserialize)]
struct RateSheet {
    rates: Vec<RateEntry>,
}

#[derive(Debug, Deserialize)]
struct RateEntry {
    code: String,
    ask: f64,
}

impl HttpRateSource {
    /// base_url 形如 https://api.nbp.pl/api；timeout 约束整个请求
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ExchangeError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExchangeError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            url: format!("{}/exchangerates/tables/C", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch(&self) -> Result<BTreeMap<CurrencyCode, Decimal>, ExchangeError> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ExchangeError::Unavailable(format!("request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(ExchangeError::Unavailable(format!(
                "source returned {}",
                response.status()
            )));
        }

        let sheets: Vec<RateSheet> = response
            .json()
            .await
            .map_err(|e| ExchangeError::Unavailable(format!("malformed response: {e}")))?;

        let sheet = sheets
            .into_iter()
            .next()
            .ok_or_else(|| ExchangeError::Unavailable("empty rate table response".into()))?;

        let mut rates = BTreeMap::new();
        for entry in sheet.rates {
            let code = CurrencyCode::parse(&entry.code).map_err(|e| {
                ExchangeError::Unavailable(format!("bad currency code in response: {e}"))
            })?;
            let rate = Decimal::from_f64_retain(entry.ask)
                .ok_or_else(|| ExchangeError::Unavailable(format!("bad rate value: {}", entry.ask)))?;
            rates.insert(code, rate);
        }
        Ok(rates)
    }
}

/// 汇率缓存
///
/// - TTL 内的读取直接命中缓存
/// - 过期/冷启动时恰好触发一次远端抓取，并发调用共享结果
/// - 刷新失败绝不更新缓存表或其时间戳；默认 fail-closed，
///   `serve_stale` 开启后可回退到上一张成功的表
pub struct ExchangeRateService {
    source: Arc<dyn RateSource>,
    ttl: chrono::Duration,
    serve_stale: bool,
    cached: RwLock<Option<RateTable>>,
    refresh_lock: Mutex<()>,
}

impl ExchangeRateService {
    pub fn new(source: Arc<dyn RateSource>, ttl: Duration, serve_stale: bool) -> Self {
        Self {
            source,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::seconds(1800)),
            serve_stale,
            cached: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    pub async fn get_rates(&self) -> Result<RateTable, ExchangeError> {
        if let Some(table) = self.fresh_table().await {
            return Ok(table);
        }

        // single-flight：未命中的并发调用在此排队，共享下面这一次抓取
        let _guard = self.refresh_lock.lock().await;

        // 排队期间可能已有调用完成刷新
        if let Some(table) = self.fresh_table().await {
            return Ok(table);
        }

        let started = std::time::Instant::now();
        match self.source.fetch().await {
            Ok(rates) => {
                crate::metrics::rate_fetch_ok(started.elapsed().as_millis());
                // 汇率入缓存前统一经过金额舍入规则
                let rates = rates
                    .into_iter()
                    .map(|(code, rate)| (code, Money::new(rate).amount()))
                    .collect();
                let table = RateTable {
                    rates,
                    fetched_at: Utc::now(),
                };
                *self.cached.write().await = Some(table.clone());
                tracing::info!(currencies = table.rates.len(), "exchange rate table refreshed");
                Ok(table)
            }
            Err(err) => {
                crate::metrics::rate_fetch_err();
                if self.serve_stale {
                    if let Some(stale) = self.cached.read().await.clone() {
                        tracing::warn!(
                            error = %err,
                            fetched_at = %stale.fetched_at,
                            "serving stale exchange rates after refresh failure"
                        );
                        return Ok(stale);
                    }
                }
                tracing::error!(error = %err, "exchange rate refresh failed");
                Err(err)
            }
        }
    }

    /// 缓存年龄（秒），健康检查用；尚无缓存时返回 None
    pub async fn cache_age_secs(&self) -> Option<i64> {
        let cached = self.cached.read().await;
        cached.as_ref().map(|t| t.age().num_seconds())
    }

    async fn fresh_table(&self) -> Option<RateTable> {
        let cached = self.cached.read().await;
        cached.as_ref().filter(|t| t.age() < self.ttl).cloned()
    }
}

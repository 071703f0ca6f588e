//! 配置管理模块
//! 支持从环境变量和TOML配置文件加载；启动时显式构造一次并向下传递，
//! 不使用模块级单例

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub jwt: JwtConfig,
    #[serde(default)]
    pub exchange: ExchangeConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

/// 数据库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// JWT配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(default)]
    pub secret: String,
    #[serde(default = "default_token_expiry_secs")]
    pub token_expiry_secs: u64,
}

/// 汇率服务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeConfig {
    /// 远端汇率源根地址（NBP 风格接口）
    #[serde(default = "default_exchange_base_url")]
    pub base_url: String,
    /// 汇率表缓存TTL（秒）
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// 单次抓取超时（秒）
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// 刷新失败时是否回退到上一张成功的汇率表；默认 fail-closed
    #[serde(default)]
    pub serve_stale_rates: bool,
    /// 估值使用的参考货币
    #[serde(default = "default_reference_currency")]
    pub reference_currency: String,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    /// "text" 或 "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_bind_addr() -> String {
    "0.0.0.0:8080".into()
}
fn default_database_url() -> String {
    "postgres://localhost:5432/fiatvault".into()
}
fn default_max_connections() -> u32 {
    16
}
fn default_min_connections() -> u32 {
    2
}
fn default_acquire_timeout_secs() -> u64 {
    5
}
fn default_idle_timeout_secs() -> u64 {
    300
}
fn default_token_expiry_secs() -> u64 {
    3600
}
fn default_exchange_base_url() -> String {
    "https://api.nbp.pl/api".into()
}
fn default_cache_ttl_secs() -> u64 {
    1800
}
fn default_fetch_timeout_secs() -> u64 {
    10
}
fn default_reference_currency() -> String {
    "PLN".into()
}
fn default_log_level() -> String {
    "fiatvault=debug,tower_http=debug,sqlx=warn".into()
}
fn default_log_format() -> String {
    "text".into()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: default_idle_timeout_secs(),
        }
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            token_expiry_secs: default_token_expiry_secs(),
        }
    }
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            base_url: default_exchange_base_url(),
            cache_ttl_secs: default_cache_ttl_secs(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            serve_stale_rates: false,
            reference_currency: default_reference_currency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// 仅从环境变量加载，未设置的项使用默认值
    pub fn from_env() -> Result<Self> {
        let mut config = Config {
            server: ServerConfig::default(),
            database: DatabaseConfig::default(),
            jwt: JwtConfig::default(),
            exchange: ExchangeConfig::default(),
            logging: LoggingConfig::default(),
        };

        if let Ok(addr) = std::env::var("BIND_ADDR") {
            config.server.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = url;
        }
        if let Ok(n) = std::env::var("DB_MAX_CONNS") {
            if let Ok(n) = n.parse() {
                config.database.max_connections = n;
            }
        }
        if let Ok(secret) = std::env::var("JWT_SECRET") {
            config.jwt.secret = secret;
        }
        if let Ok(n) = std::env::var("JWT_TOKEN_EXPIRY_SECS") {
            if let Ok(n) = n.parse() {
                config.jwt.token_expiry_secs = n;
            }
        }
        if let Ok(url) = std::env::var("EXCHANGE_API_BASE_URL") {
            config.exchange.base_url = url;
        }
        if let Ok(n) = std::env::var("EXCHANGE_CACHE_TTL_SECS") {
            if let Ok(n) = n.parse() {
                config.exchange.cache_ttl_secs = n;
            }
        }
        if let Ok(n) = std::env::var("EXCHANGE_FETCH_TIMEOUT_SECS") {
            if let Ok(n) = n.parse() {
                config.exchange.fetch_timeout_secs = n;
            }
        }
        if let Ok(v) = std::env::var("EXCHANGE_SERVE_STALE_RATES") {
            config.exchange.serve_stale_rates = matches!(v.as_str(), "1" | "true" | "yes");
        }
        if let Ok(code) = std::env::var("REFERENCE_CURRENCY") {
            config.exchange.reference_currency = code;
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// 优先从TOML配置文件加载，文件不存在时回退到环境变量
    pub fn from_env_and_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(p) if Path::new(p).exists() => {
                let raw = std::fs::read_to_string(p)
                    .with_context(|| format!("failed to read config file {p}"))?;
                let config: Config = toml::from_str(&raw)
                    .with_context(|| format!("failed to parse config file {p}"))?;
                Ok(config)
            }
            _ => Self::from_env(),
        }
    }
}

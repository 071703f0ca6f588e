//! FiatVault 主入口
//! 多币种钱包账本服务

use std::sync::Arc;

use anyhow::Result;
use fiatvault::{api, app_state::AppState, config::Config, infrastructure::db};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // 1. 加载环境变量
    dotenvy::dotenv().ok();

    // 2. 加载配置（CONFIG_PATH 可指向 TOML 文件，否则读环境变量）
    let config = Arc::new(Config::from_env_and_file(
        std::env::var("CONFIG_PATH").ok().as_deref(),
    )?);

    // JWT 模块从环境变量读取密钥；配置文件提供时在此落位
    if std::env::var("JWT_SECRET").is_err() && !config.jwt.secret.is_empty() {
        std::env::set_var("JWT_SECRET", &config.jwt.secret);
    }
    if std::env::var("JWT_TOKEN_EXPIRY_SECS").is_err() {
        std::env::set_var(
            "JWT_TOKEN_EXPIRY_SECS",
            config.jwt.token_expiry_secs.to_string(),
        );
    }

    // 3. 初始化日志
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));
    if config.logging.format == "json" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!("Starting FiatVault wallet ledger service");

    // 4. 连接数据库
    let pool = db::init_pool(&config.database).await?;
    tracing::info!("Database connected");

    // 5. 运行数据库迁移（生产环境建议单独执行）
    if std::env::var("SKIP_MIGRATIONS").is_err() {
        match sqlx::migrate!("./migrations").run(&pool).await {
            Ok(_) => tracing::info!("Database migrations completed"),
            Err(e) => {
                tracing::warn!("Database migrations failed (continuing): {}", e);
                tracing::info!("Tip: Set SKIP_MIGRATIONS=1 to skip migrations on startup");
            }
        }
    } else {
        tracing::info!("Database migrations skipped (SKIP_MIGRATIONS=1)");
    }

    // 6. 初始化应用状态（汇率缓存 + 钱包服务）
    let state = Arc::new(AppState::new(pool, config.clone())?);

    // 7. 构建API路由并启动服务器
    let app = api::routes(state);
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| config.server.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!("Server listening on http://{}", bind_addr);
    tracing::info!("Swagger UI: http://{}/docs", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

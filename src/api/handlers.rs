use std::{collections::BTreeMap, sync::Arc};

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::{middleware::auth::AuthInfoExtractor, response::success_response},
    app_state::AppState,
    domain::{CurrencyCode, Money},
    error::AppError,
    infrastructure::password::Password,
    service::{self, wallet_service::WalletSnapshot},
};

// ========== Health API ==========

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
}

#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "OK", body = HealthResponse))
)]
pub async fn api_health(
) -> Result<Json<crate::api::response::ApiResponse<HealthResponse>>, AppError> {
    crate::metrics::count_ok("GET /api/health");
    success_response(HealthResponse {
        status: "ok".into(),
    })
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Healthz {
    pub status: String,
    pub db_ok: bool,
    /// 是否已有成功抓取的汇率表
    pub rates_cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_cache_age_secs: Option<i64>,
    pub version: String,
}

#[utoipa::path(
    get,
    path = "/healthz",
    responses((status = 200, description = "OK", body = Healthz))
)]
pub async fn healthz(
    State(st): State<Arc<AppState>>,
) -> Result<Json<crate::api::response::ApiResponse<Healthz>>, AppError> {
    let (db_probe, rate_cache_age_secs) = futures::join!(
        crate::infrastructure::db::health_check(&st.pool),
        st.exchange.cache_age_secs(),
    );
    let db_ok = db_probe.is_ok();

    let status = if db_ok { "ok" } else { "degraded" };
    let version = format!(
        "{}+{}",
        env!("CARGO_PKG_VERSION"),
        option_env!("GIT_HASH").unwrap_or("dev")
    );

    success_response(Healthz {
        status: status.into(),
        db_ok,
        rates_cached: rate_cache_age_secs.is_some(),
        rate_cache_age_secs,
        version,
    })
}

// ========== Auth API ==========

#[derive(Debug, Deserialize, ToSchema)]
pub struct RegisterReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterResp {
    pub access_token: String,
    pub user: UserInfo,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 200, description = "Registration successful", body = RegisterResp),
        (status = 400, description = "Invalid request", body = crate::error_body::ErrorBodyDoc),
        (status = 409, description = "Email already registered", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn register(
    State(st): State<Arc<AppState>>,
    Json(req): Json<RegisterReq>,
) -> Result<Json<crate::api::response::ApiResponse<RegisterResp>>, AppError> {
    crate::metrics::count_ok("POST /api/auth/register");

    let password = Password::new(req.password);
    let outcome = service::auth::register(&st.pool, &req.email, &password)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "registration failed");
            let msg = e.to_string();
            if msg.contains("already registered") {
                AppError::user_already_exists(msg)
            } else {
                AppError::bad_request(msg)
            }
        })?;

    success_response(RegisterResp {
        access_token: outcome.access_token,
        user: UserInfo {
            id: outcome.user_id.to_string(),
            email: outcome.email,
            created_at: outcome.created_at.to_rfc3339(),
        },
    })
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginReq {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResp {
    pub access_token: String,
    pub user: UserInfo,
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Login successful", body = LoginResp),
        (status = 401, description = "Invalid credentials", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn login(
    State(st): State<Arc<AppState>>,
    Json(req): Json<LoginReq>,
) -> Result<Json<crate::api::response::ApiResponse<LoginResp>>, AppError> {
    crate::metrics::count_ok("POST /api/auth/login");

    let password = Password::new(req.password);
    let outcome = service::auth::login(&st.pool, &req.email, &password)
        .await
        .map_err(|e| AppError::invalid_credentials(e.to_string()))?;

    success_response(LoginResp {
        access_token: outcome.access_token,
        user: UserInfo {
            id: outcome.user_id.to_string(),
            email: outcome.email,
            created_at: outcome.created_at.to_rfc3339(),
        },
    })
}

// ========== Wallet API ==========

#[derive(Debug, Deserialize, ToSchema)]
pub struct WalletOperationReq {
    /// 3位货币代码，如 "EUR"
    pub currency: String,
    /// 十进制字符串或数字，严格为正
    #[schema(value_type = String)]
    pub amount: Decimal,
}

/// 钱包快照：原始余额 + 参考货币估值
/// 字段名 pln_values/total_pln 保持与既有调用方的线上契约一致
#[derive(Debug, Serialize, ToSchema)]
pub struct WalletResp {
    #[schema(value_type = Object)]
    pub balances: BTreeMap<CurrencyCode, Money>,
    #[schema(value_type = Object)]
    pub pln_values: BTreeMap<CurrencyCode, Money>,
    #[schema(value_type = String)]
    pub total_pln: Money,
}

impl From<WalletSnapshot> for WalletResp {
    fn from(snapshot: WalletSnapshot) -> Self {
        Self {
            balances: snapshot.wallet.balances,
            pln_values: snapshot.valuation.values,
            total_pln: snapshot.valuation.total,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/wallet",
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Wallet snapshot", body = WalletResp),
        (status = 401, description = "Not authenticated", body = crate::error_body::ErrorBodyDoc),
        (status = 503, description = "Exchange rates unavailable", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn get_wallet(
    State(st): State<Arc<AppState>>,
    AuthInfoExtractor(auth): AuthInfoExtractor,
) -> Result<Json<crate::api::response::ApiResponse<WalletResp>>, AppError> {
    crate::metrics::count_ok("GET /api/wallet");

    let snapshot = st.wallet_service.get_snapshot(auth.user_id).await?;
    success_response(WalletResp::from(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/wallet/add",
    request_body = WalletOperationReq,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Updated wallet snapshot", body = WalletResp),
        (status = 400, description = "Invalid amount or currency", body = crate::error_body::ErrorBodyDoc),
        (status = 401, description = "Not authenticated", body = crate::error_body::ErrorBodyDoc),
        (status = 503, description = "Exchange rates unavailable", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn wallet_add(
    State(st): State<Arc<AppState>>,
    AuthInfoExtractor(auth): AuthInfoExtractor,
    Json(req): Json<WalletOperationReq>,
) -> Result<Json<crate::api::response::ApiResponse<WalletResp>>, AppError> {
    let (currency, amount) = parse_operation("POST /api/wallet/add", &req)?;
    crate::metrics::count_ok("POST /api/wallet/add");

    let snapshot = st.wallet_service.deposit(auth.user_id, &currency, amount).await?;
    success_response(WalletResp::from(snapshot))
}

#[utoipa::path(
    post,
    path = "/api/wallet/subtract",
    request_body = WalletOperationReq,
    security(("bearer_token" = [])),
    responses(
        (status = 200, description = "Updated wallet snapshot", body = WalletResp),
        (status = 400, description = "Invalid input or insufficient funds", body = crate::error_body::ErrorBodyDoc),
        (status = 401, description = "Not authenticated", body = crate::error_body::ErrorBodyDoc),
        (status = 503, description = "Exchange rates unavailable", body = crate::error_body::ErrorBodyDoc)
    )
)]
pub async fn wallet_subtract(
    State(st): State<Arc<AppState>>,
    AuthInfoExtractor(auth): AuthInfoExtractor,
    Json(req): Json<WalletOperationReq>,
) -> Result<Json<crate::api::response::ApiResponse<WalletResp>>, AppError> {
    let (currency, amount) = parse_operation("POST /api/wallet/subtract", &req)?;
    crate::metrics::count_ok("POST /api/wallet/subtract");

    let snapshot = st
        .wallet_service
        .withdraw(auth.user_id, &currency, amount)
        .await?;
    success_response(WalletResp::from(snapshot))
}

/// 请求形状校验：货币代码与正金额，失败立即拒绝，不触达存储
fn parse_operation(
    endpoint: &'static str,
    req: &WalletOperationReq,
) -> Result<(CurrencyCode, Money), AppError> {
    let currency = CurrencyCode::parse(&req.currency).map_err(|e| {
        crate::metrics::count_err(endpoint);
        AppError::validation_failed(e.to_string())
    })?;
    let amount = Money::positive(req.amount).map_err(|e| {
        crate::metrics::count_err(endpoint);
        AppError::invalid_amount(e.to_string())
    })?;
    Ok((currency, amount))
}

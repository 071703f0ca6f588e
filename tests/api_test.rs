//! API 层集成测试
//! 内存余额存储 + 脚本汇率源装配完整路由，验证认证边界与错误码映射
//! （register/login 依赖真实数据库，见 #[ignore] 的数据库用例约定）

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use common::ScriptedRateSource;
use fiatvault::{
    app_state::AppState,
    config::Config,
    infrastructure::{db, jwt},
    repository::MemoryWalletStore,
};
use serde_json::{json, Value};
use tower::util::ServiceExt;
use uuid::Uuid;

fn test_router() -> Router {
    std::env::set_var(
        "JWT_SECRET",
        "integration_test_secret_at_least_32_chars_long",
    );

    let config = Arc::new(Config::from_env_and_file(None).unwrap());
    let pool = db::init_pool_lazy(&config.database).unwrap();
    let state = AppState::with_components(
        pool,
        config,
        Arc::new(MemoryWalletStore::new()),
        Arc::new(ScriptedRateSource::with_default_rates()),
    )
    .unwrap();

    fiatvault::api::routes(Arc::new(state))
}

fn bearer_for(user_id: Uuid) -> String {
    format!("Bearer {}", jwt::generate_token(user_id).unwrap())
}

async fn read_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn wallet_op(app: &Router, auth: &str, path: &str, currency: &str, amount: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json")
        .header("Authorization", auth)
        .body(Body::from(
            json!({ "currency": currency, "amount": amount }).to_string(),
        ))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    (status, read_json(response).await)
}

#[tokio::test]
async fn test_health_endpoint_is_public() {
    let app = test_router();

    let response = app
        .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn test_metrics_endpoint_renders_prometheus_text() {
    let app = test_router();

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("fiatvault_requests_total"));
}

#[tokio::test]
async fn test_wallet_requires_bearer_token() {
    let app = test_router();

    let response = app
        .clone()
        .oneshot(Request::get("/api/wallet").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "unauthorized");

    let response = app
        .oneshot(
            Request::get("/api/wallet")
                .header("Authorization", "Bearer not-a-real-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], "token_invalid");
}

#[tokio::test]
async fn test_wallet_flow_over_http() {
    let app = test_router();
    let auth = bearer_for(Uuid::new_v4());

    // 新用户：参考货币零余额
    let response = app
        .clone()
        .oneshot(
            Request::get("/api/wallet")
                .header("Authorization", &auth)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["data"]["balances"]["PLN"], "0.00");
    assert_eq!(body["data"]["total_pln"], "0.00");

    // 入账 EUR 100.00 → 按 4.50 估值
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/add", "EUR", "100.00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balances"]["EUR"], "100.00");
    assert_eq!(body["data"]["pln_values"]["EUR"], "450.00");
    assert_eq!(body["data"]["total_pln"], "450.00");

    // 出账 EUR 40.00
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/subtract", "EUR", "40.00").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["balances"]["EUR"], "60.00");
    assert_eq!(body["data"]["total_pln"], "270.00");

    // 超额出账被拒绝
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/subtract", "EUR", "100.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "insufficient_balance");
}

#[tokio::test]
async fn test_wallet_input_error_codes() {
    let app = test_router();
    let auth = bearer_for(Uuid::new_v4());

    // 形状非法的货币代码
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/add", "EURO", "10.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_failed");

    // 形状合法但汇率表中不存在
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/add", "GBP", "10.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_currency");

    // 非正金额
    let (status, body) = wallet_op(&app, &auth, "/api/wallet/add", "EUR", "-5.00").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_amount");
}

#[tokio::test]
async fn test_rates_outage_maps_to_service_unavailable() {
    std::env::set_var(
        "JWT_SECRET",
        "integration_test_secret_at_least_32_chars_long",
    );
    let config = Arc::new(Config::from_env_and_file(None).unwrap());
    let pool = db::init_pool_lazy(&config.database).unwrap();
    let state = AppState::with_components(
        pool,
        config,
        Arc::new(MemoryWalletStore::new()),
        Arc::new(ScriptedRateSource::failing()),
    )
    .unwrap();
    let app = fiatvault::api::routes(Arc::new(state));

    let response = app
        .oneshot(
            Request::get("/api/wallet")
                .header("Authorization", bearer_for(Uuid::new_v4()))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = read_json(response).await;
    assert_eq!(body["code"], "exchange_rate_unavailable");
}

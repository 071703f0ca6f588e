//! API 路由与 OpenAPI 文档

use std::sync::Arc;

use axum::{
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;

use crate::{
    api::middleware::{auth_middleware, trace_id_middleware},
    app_state::AppState,
};

pub mod handlers;
pub mod middleware;
pub mod response;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register,
        handlers::login,
        handlers::get_wallet,
        handlers::wallet_add,
        handlers::wallet_subtract,
        handlers::api_health,
        handlers::healthz,
    ),
    components(schemas(
        handlers::RegisterReq,
        handlers::RegisterResp,
        handlers::LoginReq,
        handlers::LoginResp,
        handlers::UserInfo,
        handlers::WalletOperationReq,
        handlers::WalletResp,
        handlers::HealthResponse,
        handlers::Healthz,
        crate::error_body::ErrorBodyDoc
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "FiatVault API", description = "Multi-currency wallet ledger API")
    )
)]
struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

pub fn routes(state: Arc<AppState>) -> Router {
    // 公开路由（不需要认证）
    let public_routes = Router::new()
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/health", get(handlers::api_health))
        .route("/healthz", get(handlers::healthz))
        .route(
            "/metrics",
            get(|| async { crate::metrics::render_prometheus().into_response() }),
        )
        .merge(utoipa_swagger_ui::SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()));

    // 需要认证的钱包路由
    let protected_routes = Router::new()
        .route("/api/wallet", get(handlers::get_wallet))
        .route("/api/wallet/add", post(handlers::wallet_add))
        .route("/api/wallet/subtract", post(handlers::wallet_subtract))
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    // 观测与跨域中间件对全部路由生效
    public_routes
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(trace_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

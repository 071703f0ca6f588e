//! 认证中间件
//! 验证 Bearer Token 并向请求注入 AuthInfo

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{app_state::AppState, error::AppError, infrastructure::jwt::verify_token};

/// 认证信息（从Token中提取）
#[derive(Clone)]
pub struct AuthInfo {
    pub user_id: Uuid,
}

/// 认证流程：
/// 1. 提取 Authorization 头并校验 Bearer 格式
/// 2. 验证 JWT 签名与过期时间
/// 3. 提取 user_id 注入请求扩展
pub async fn auth_middleware(
    State(_st): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    // CORS 预检请求直接放行，不需要认证
    if req.method() == axum::http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    let trace_id = req.extensions().get::<String>().cloned();

    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| {
            reject(AppError::unauthorized("Authorization header required"), &trace_id)
        })?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| {
            reject(
                AppError::unauthorized("Invalid authorization header format"),
                &trace_id,
            )
        })?
        .trim();

    let claims = verify_token(token).map_err(|e| {
        tracing::debug!(error = %e, "token verification failed");
        reject(AppError::token_invalid("Invalid or expired token"), &trace_id)
    })?;

    let user_id = claims
        .user_id()
        .map_err(|_| reject(AppError::token_invalid("Invalid token subject"), &trace_id))?;

    req.extensions_mut().insert(AuthInfo { user_id });

    Ok(next.run(req).await)
}

fn reject(err: AppError, trace_id: &Option<String>) -> AppError {
    match trace_id {
        Some(t) => err.with_trace_id(t.clone()),
        None => err,
    }
}

/// 认证信息提取器（handler函数参数用）
#[derive(Clone)]
pub struct AuthInfoExtractor(pub AuthInfo);

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthInfoExtractor
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let auth_info = parts
            .extensions
            .get::<AuthInfo>()
            .cloned()
            .ok_or_else(|| AppError::unauthorized("Not authenticated"))?;
        Ok(AuthInfoExtractor(auth_info))
    }
}

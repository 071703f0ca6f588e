use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::service::wallet_service::WalletError;

#[derive(Debug, Clone)]
pub enum AppErrorCode {
    // HTTP 基础错误码
    BadRequest,
    Unauthorized,
    NotFound,
    Internal,

    // 业务错误码
    InvalidAmount,
    InvalidCurrency,
    InsufficientBalance,
    ExchangeRateUnavailable,
    UserAlreadyExists,
    InvalidCredentials,
    TokenInvalid,
    ValidationFailed,
    DatabaseError,
}

/// API 边界统一错误：稳定的机器可读 code + 人类可读 message
/// 调用方错误落在 4xx，基础设施错误落在 5xx
#[derive(Debug, Clone)]
pub struct AppError {
    pub code: AppErrorCode,
    pub message: String,
    pub status: StatusCode,
    pub trace_id: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    trace_id: Option<&'a str>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code_str = match self.code {
            AppErrorCode::BadRequest => "bad_request",
            AppErrorCode::Unauthorized => "unauthorized",
            AppErrorCode::NotFound => "not_found",
            AppErrorCode::Internal => "internal",

            AppErrorCode::InvalidAmount => "invalid_amount",
            AppErrorCode::InvalidCurrency => "invalid_currency",
            AppErrorCode::InsufficientBalance => "insufficient_balance",
            AppErrorCode::ExchangeRateUnavailable => "exchange_rate_unavailable",
            AppErrorCode::UserAlreadyExists => "user_already_exists",
            AppErrorCode::InvalidCredentials => "invalid_credentials",
            AppErrorCode::TokenInvalid => "token_invalid",
            AppErrorCode::ValidationFailed => "validation_failed",
            AppErrorCode::DatabaseError => "database_error",
        };
        let body = ErrorBody {
            code: code_str,
            message: &self.message,
            trace_id: self.trace_id.as_deref(),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::BadRequest,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Unauthorized,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            trace_id: None,
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::NotFound,
            message: msg.into(),
            status: StatusCode::NOT_FOUND,
            trace_id: None,
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::Internal,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            trace_id: None,
        }
    }

    // 业务错误辅助函数

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidAmount,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn invalid_currency(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidCurrency,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn insufficient_balance(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InsufficientBalance,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn exchange_rate_unavailable(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ExchangeRateUnavailable,
            message: msg.into(),
            status: StatusCode::SERVICE_UNAVAILABLE,
            trace_id: None,
        }
    }

    pub fn user_already_exists(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::UserAlreadyExists,
            message: msg.into(),
            status: StatusCode::CONFLICT,
            trace_id: None,
        }
    }

    pub fn invalid_credentials(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::InvalidCredentials,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            trace_id: None,
        }
    }

    pub fn token_invalid(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::TokenInvalid,
            message: msg.into(),
            status: StatusCode::UNAUTHORIZED,
            trace_id: None,
        }
    }

    pub fn validation_failed(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::ValidationFailed,
            message: msg.into(),
            status: StatusCode::BAD_REQUEST,
            trace_id: None,
        }
    }

    pub fn database_error(msg: impl Into<String>) -> Self {
        Self {
            code: AppErrorCode::DatabaseError,
            message: msg.into(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
            trace_id: None,
        }
    }

    /// 设置追踪ID
    pub fn with_trace_id(mut self, trace_id: String) -> Self {
        self.trace_id = Some(trace_id);
        self
    }
}

// 领域错误 → API 错误：调用方错误映射 4xx，基础设施错误映射 5xx
impl From<WalletError> for AppError {
    fn from(err: WalletError) -> Self {
        match &err {
            WalletError::InvalidAmount(_) => Self::invalid_amount(err.to_string()),
            WalletError::InvalidCurrency(_) => Self::invalid_currency(err.to_string()),
            WalletError::InsufficientFunds(_) => Self::insufficient_balance(err.to_string()),
            WalletError::RatesUnavailable => {
                Self::exchange_rate_unavailable("Exchange rate service temporarily unavailable")
            }
            WalletError::Storage(_) => Self::database_error("Wallet storage unavailable"),
        }
    }
}

// 从 SQLx 错误转换
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::not_found("Resource not found"),
            sqlx::Error::Database(ref db_err) => {
                if db_err.code().as_deref() == Some("23505") {
                    // PostgreSQL unique_violation
                    return Self::user_already_exists("Resource already exists");
                }
                Self::internal(format!("Database error: {}", db_err))
            }
            _ => Self::internal(format!("Database operation failed: {}", err)),
        }
    }
}

// 从 anyhow 错误转换
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal(format!("{}", err))
    }
}

// 从 serde_json 错误转换
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::bad_request(format!("JSON serialization error: {}", err))
    }
}

//! OpenAPI 错误响应schema
//! 运行时错误体由 AppError 序列化，这里只提供文档用的结构

use serde::Serialize;
use utoipa::ToSchema;

#[derive(Serialize, ToSchema)]
pub struct ErrorBodyDoc {
    /// 稳定的机器可读错误码，如 "insufficient_balance"
    #[schema(example = "insufficient_balance")]
    pub code: String,
    pub message: String,
    /// 全链路追踪ID，与响应头 X-Trace-Id 一致
    #[schema(nullable)]
    pub trace_id: Option<String>,
}

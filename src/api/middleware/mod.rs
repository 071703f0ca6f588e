pub mod auth;
pub mod trace_id;

pub use auth::{auth_middleware, AuthInfo, AuthInfoExtractor};
pub use trace_id::trace_id_middleware;

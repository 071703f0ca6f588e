//! JWT Token 生成和验证模块

use anyhow::{anyhow, Result};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub exp: i64,    // Expiration time
    pub iat: i64,    // Issued at
    pub jti: String, // JWT ID，确保每个token唯一
}

impl Claims {
    pub fn new(user_id: Uuid, expires_in_secs: i64) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id.to_string(),
            exp: (now + Duration::seconds(expires_in_secs)).timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// 获取用户 ID（UUID）
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|e| anyhow!("Invalid user ID in claims: {}", e))
    }
}

/// 生成JWT Token，过期时间从环境变量读取，默认1小时
pub fn generate_token(user_id: Uuid) -> Result<String> {
    let expires_in_secs = std::env::var("JWT_TOKEN_EXPIRY_SECS")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(3600);

    generate_token_with_expiry(user_id, expires_in_secs)
}

pub fn generate_token_with_expiry(user_id: Uuid, expires_in_secs: i64) -> Result<String> {
    let secret = get_jwt_secret()?;
    let claims = Claims::new(user_id, expires_in_secs);

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| anyhow!("Failed to encode token: {}", e))
}

/// 验证JWT Token（签名 + 过期时间）
pub fn verify_token(token: &str) -> Result<Claims> {
    let secret = get_jwt_secret()?;

    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.leeway = 10; // 允许10秒时钟偏差

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| anyhow!("Token verification failed: {}", e))?;

    Ok(token_data.claims)
}

fn get_jwt_secret() -> Result<String> {
    let secret = std::env::var("JWT_SECRET").map_err(|_| anyhow!("JWT_SECRET must be set"))?;
    if secret.len() < 32 {
        return Err(anyhow!("JWT_SECRET must be at least 32 characters"));
    }
    Ok(secret)
}

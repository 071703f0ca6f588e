//! 认证服务层
//! 处理注册、登录与凭据校验

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    infrastructure::{
        db::PgPool,
        jwt::generate_token,
        password::{hash_password, verify_password, Password},
        validation::{validate_email, validate_password_strength},
    },
    repository::users,
};

pub struct AuthOutcome {
    pub access_token: String,
    pub user_id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// 用户注册
///
/// # Arguments
/// * `email` - 明文邮箱，入库前做形状校验
/// * `password` - 明文密码，bcrypt 哈希后存储
pub async fn register(pool: &PgPool, email: &str, password: &Password) -> Result<AuthOutcome> {
    validate_email(email)?;
    validate_password_strength(password.as_str())?;

    if users::get_by_email(pool, email).await?.is_some() {
        return Err(anyhow!("Email already registered"));
    }

    let password_hash = hash_password(password.as_str())?;
    let user = match users::create(pool, email, &password_hash).await {
        Ok(user) => user,
        // 并发注册同一邮箱时以唯一索引的判定为准
        Err(sqlx::Error::Database(db_err)) if db_err.code().as_deref() == Some("23505") => {
            return Err(anyhow!("Email already registered"));
        }
        Err(err) => return Err(err.into()),
    };

    let access_token = generate_token(user.id)?;
    tracing::info!(user_id = %user.id, "user registered");

    Ok(AuthOutcome {
        access_token,
        user_id: user.id,
        email: user.email,
        created_at: user.created_at,
    })
}

/// 用户登录：凭据错误统一返回同一条消息，不区分"用户不存在"与"密码错误"
pub async fn login(pool: &PgPool, email: &str, password: &Password) -> Result<AuthOutcome> {
    let user = users::get_by_email(pool, email)
        .await?
        .ok_or_else(|| anyhow!("Invalid credentials"))?;

    if !verify_password(password.as_str(), &user.password_hash)? {
        return Err(anyhow!("Invalid credentials"));
    }

    let access_token = generate_token(user.id)?;

    Ok(AuthOutcome {
        access_token,
        user_id: user.id,
        email: user.email,
        created_at: user.created_at,
    })
}

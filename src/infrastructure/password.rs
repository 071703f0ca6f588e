//! 密码哈希与验证（bcrypt）

use anyhow::{anyhow, Result};
use bcrypt::{hash, verify, DEFAULT_COST};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 明文密码包装器：离开作用域时清零内存
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

pub fn hash_password(password: &str) -> Result<String> {
    hash(password, DEFAULT_COST).map_err(|e| anyhow!("Failed to hash password: {}", e))
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    verify(password, hash).map_err(|e| anyhow!("Failed to verify password: {}", e))
}

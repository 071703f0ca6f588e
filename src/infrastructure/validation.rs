//! 输入验证模块
//! 进入服务层之前对不可信输入做形状校验

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("invalid email regex")
});

pub fn validate_email(email: &str) -> Result<()> {
    if email.len() > 255 {
        return Err(anyhow!("Email is too long"));
    }
    if !EMAIL_RE.is_match(email) {
        return Err(anyhow!("Invalid email format"));
    }
    Ok(())
}

/// 验证密码强度（至少8个字符，包含字母和数字）
pub fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(anyhow!("Password must be at least 8 characters"));
    }
    if password.len() > 128 {
        return Err(anyhow!("Password too long"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(anyhow!("Password must contain at least one digit"));
    }

    if !password.chars().any(|c| c.is_ascii_alphabetic()) {
        return Err(anyhow!("Password must contain at least one letter"));
    }

    Ok(())
}

//! 货币金额值类型
//! 所有对外可见的金额统一保留2位小数，使用银行家舍入（round-half-to-even）

use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// 金额的固定小数位数（合同精度）
pub const MONEY_SCALE: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoneyError {
    #[error("amount must be a positive value")]
    NotPositive,
}

/// 精确十进制金额
///
/// 不变式：构造后的值始终规整到2位小数。中间运算（如乘以汇率）
/// 使用完整精度，只在结果对外可见时做一次舍入，避免误差累积。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Money(Decimal);

impl Money {
    /// 规整任意精度的原始值为合同精度金额
    pub fn new(raw: Decimal) -> Self {
        Self(normalize(raw))
    }

    pub fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// 从不可信输入构造严格为正的金额
    ///
    /// 拒绝负数、零，以及小于合同精度、规整后归零的值（如 0.001）。
    pub fn positive(raw: Decimal) -> Result<Self, MoneyError> {
        let money = Self::new(raw);
        if !money.is_positive() {
            return Err(MoneyError::NotPositive);
        }
        Ok(money)
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn add(&self, other: Money) -> Money {
        Money::new(self.0 + other.0)
    }

    /// 差值为负时返回 None，余额不变式由调用方维护
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        let diff = self.0 - other.0;
        if diff < Decimal::ZERO {
            None
        } else {
            Some(Money::new(diff))
        }
    }

    /// 按汇率换算：完整精度相乘，仅对结果做一次舍入
    pub fn mul_rate(&self, rate: Decimal) -> Money {
        Money::new(self.0 * rate)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

/// 2位小数银行家舍入，并固定scale以保证序列化输出形如 "0.00"
fn normalize(raw: Decimal) -> Decimal {
    let mut d = raw.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven);
    d.rescale(MONEY_SCALE);
    d
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 线上传输始终使用十进制字符串，杜绝二进制浮点精度损失
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&self.0, serializer)
    }
}

// 反序列化接受字符串或JSON数字，入口处即规整
impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = <Decimal as Deserialize>::deserialize(deserializer)?;
        Ok(Money::new(raw))
    }
}

//! 估值引擎：余额快照 × 汇率表 → 参考货币估值
//! 纯函数，无副作用、无I/O

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::{CurrencyCode, Money};

/// 某一时刻的派生估值结果，从不持久化，每次读取重新计算
#[derive(Debug, Clone, Serialize)]
pub struct Valuation {
    /// 各货币折算为参考货币后的金额
    pub values: BTreeMap<CurrencyCode, Money>,
    /// 所有已折算金额之和（精确累加，最后一次性舍入）
    pub total: Money,
}

/// 将余额折算为参考货币
///
/// 参考货币本身原值计入；汇率表中不存在的货币直接从估值中省略
/// （不报错、不按零计），原始余额仍由调用方另行返回。
pub fn value_in_reference(
    balances: &BTreeMap<CurrencyCode, Money>,
    rates: &BTreeMap<CurrencyCode, Decimal>,
    reference: &CurrencyCode,
) -> Valuation {
    let mut values = BTreeMap::new();
    let mut sum = Decimal::ZERO;

    for (currency, amount) in balances {
        let converted = if currency == reference {
            Some(*amount)
        } else {
            rates.get(currency).map(|rate| amount.mul_rate(*rate))
        };

        if let Some(value) = converted {
            sum += value.amount();
            values.insert(currency.clone(), value);
        }
    }

    Valuation {
        values,
        total: Money::new(sum),
    }
}

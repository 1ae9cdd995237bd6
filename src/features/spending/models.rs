use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 支出サマリー
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpendingSummary {
    /// 有効なサブスクリプションの月額換算合計（小数点以下2桁）
    #[serde(with = "rust_decimal::serde::float")]
    pub total_monthly: Decimal,
    /// 有効なサブスクリプションの年額換算合計（小数点以下2桁）
    #[serde(with = "rust_decimal::serde::float")]
    pub total_yearly: Decimal,
    pub active_subscriptions_count: usize,
    /// 7日以内に支払予定日を迎える有効なサブスクリプション数
    pub upcoming_due_count: usize,
}

impl SpendingSummary {
    pub fn empty() -> Self {
        Self {
            total_monthly: Decimal::ZERO,
            total_yearly: Decimal::ZERO,
            active_subscriptions_count: 0,
            upcoming_due_count: 0,
        }
    }
}

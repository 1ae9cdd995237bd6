use super::models::SpendingSummary;
use super::window::DueWindow;
use crate::features::subscriptions::models::{BillingCycle, Subscription};
use rust_decimal::{Decimal, RoundingStrategy};

/// 1か月あたりの週数（固定値）
const WEEKS_PER_MONTH: Decimal = Decimal::from_parts(433, 0, 0, false, 2);
/// 1か月あたりの日数（固定値）
const DAYS_PER_MONTH: Decimal = Decimal::from_parts(3044, 0, 0, false, 2);
const MONTHS_PER_YEAR: Decimal = Decimal::from_parts(12, 0, 0, false, 0);
const WEEKS_PER_YEAR: Decimal = Decimal::from_parts(52, 0, 0, false, 0);
const DAYS_PER_YEAR: Decimal = Decimal::from_parts(365, 0, 0, false, 0);

/// 合計金額の小数点以下桁数
const TOTAL_SCALE: u32 = 2;

impl BillingCycle {
    /// 金額を月額に換算する（丸めない）
    pub fn to_monthly(&self, price: Decimal) -> Decimal {
        match self {
            BillingCycle::Monthly => price,
            BillingCycle::Yearly => price / MONTHS_PER_YEAR,
            BillingCycle::Weekly => price * WEEKS_PER_MONTH,
            BillingCycle::Daily => price * DAYS_PER_MONTH,
        }
    }

    /// 金額を年額に換算する（丸めない）
    pub fn to_yearly(&self, price: Decimal) -> Decimal {
        match self {
            BillingCycle::Monthly => price * MONTHS_PER_YEAR,
            BillingCycle::Yearly => price,
            BillingCycle::Weekly => price * WEEKS_PER_YEAR,
            BillingCycle::Daily => price * DAYS_PER_YEAR,
        }
    }
}

/// 支出サマリーを計算する
///
/// 無効なサブスクリプションは合計・件数のどちらにも含めない。
/// 合計は全件を足し合わせた後に一度だけ小数点以下2桁へ丸める。
pub fn calculate_spending_summary(
    subscriptions: &[Subscription],
    window: &DueWindow,
) -> SpendingSummary {
    let mut summary = SpendingSummary::empty();

    for subscription in subscriptions.iter().filter(|s| s.is_active) {
        summary.total_monthly += subscription.billing_cycle.to_monthly(subscription.price);
        summary.total_yearly += subscription.billing_cycle.to_yearly(subscription.price);
        summary.active_subscriptions_count += 1;
        if window.includes(subscription) {
            summary.upcoming_due_count += 1;
        }
    }

    summary.total_monthly = round_total(summary.total_monthly);
    summary.total_yearly = round_total(summary.total_yearly);
    summary
}

fn round_total(total: Decimal) -> Decimal {
    total.round_dp_with_strategy(TOTAL_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

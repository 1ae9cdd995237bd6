use super::calculator::calculate_spending_summary;
use super::models::SpendingSummary;
use super::window::{filter_upcoming, DueWindow};
use crate::features::subscriptions::models::Subscription;
use crate::features::subscriptions::store::SubscriptionStore;
use crate::shared::errors::AppResult;
use chrono::{DateTime, Local, TimeZone};

/// 支出サマリーを取得する
///
/// 「今日」は呼び出し時点のローカル時刻で判定する。
pub fn get_spending_summary<S: SubscriptionStore>(store: &S) -> AppResult<SpendingSummary> {
    get_spending_summary_at(store, &Local::now())
}

/// 7日以内に支払予定の有効なサブスクリプションを支払予定日の昇順で取得する
pub fn get_upcoming_subscriptions<S: SubscriptionStore>(store: &S) -> AppResult<Vec<Subscription>> {
    get_upcoming_subscriptions_at(store, &Local::now())
}

/// 指定時刻を「現在」として支出サマリーを計算する
pub fn get_spending_summary_at<S, Tz>(store: &S, now: &DateTime<Tz>) -> AppResult<SpendingSummary>
where
    S: SubscriptionStore,
    Tz: TimeZone,
{
    let active = store.find_all(true)?;
    let window = DueWindow::around(now);
    let summary = calculate_spending_summary(&active, &window);

    log::debug!(
        "支出サマリーを計算しました: monthly={}, yearly={}, active={}, upcoming={}",
        summary.total_monthly,
        summary.total_yearly,
        summary.active_subscriptions_count,
        summary.upcoming_due_count
    );

    Ok(summary)
}

/// 指定時刻を「現在」として支払予定の近いサブスクリプションを取得する
pub fn get_upcoming_subscriptions_at<S, Tz>(
    store: &S,
    now: &DateTime<Tz>,
) -> AppResult<Vec<Subscription>>
where
    S: SubscriptionStore,
    Tz: TimeZone,
{
    let active = store.find_all(true)?;
    let window = DueWindow::around(now);
    let upcoming = filter_upcoming(&active, &window);

    log::debug!(
        "支払予定の近いサブスクリプション: {}件 ({} 〜 {})",
        upcoming.len(),
        window.start,
        window.end
    );

    Ok(upcoming)
}

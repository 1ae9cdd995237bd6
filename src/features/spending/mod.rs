/// 支出集計機能モジュール
///
/// 有効なサブスクリプションを月額・年額に換算した合計と、
/// 7日以内に支払予定日を迎えるサブスクリプションの抽出を提供します。
pub mod calculator;
pub mod commands;
pub mod models;
pub mod window;

pub use calculator::calculate_spending_summary;
pub use commands::{
    get_spending_summary, get_spending_summary_at, get_upcoming_subscriptions,
    get_upcoming_subscriptions_at,
};
pub use models::SpendingSummary;
pub use window::{filter_upcoming, DueWindow, DUE_SOON_DAYS};

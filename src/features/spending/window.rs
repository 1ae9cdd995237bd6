use crate::features::subscriptions::models::Subscription;
use chrono::{DateTime, Days, Duration, NaiveDate, NaiveTime, TimeZone, Utc};

/// 「もうすぐ支払い」とみなす日数（今日を含めず7日後の終わりまで）
pub const DUE_SOON_DAYS: u64 = 7;

/// 支払予定日の判定期間（両端を含む）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DueWindow {
    /// 今日の0時
    pub start: DateTime<Utc>,
    /// 7日後の23:59:59.999999999
    pub end: DateTime<Utc>,
}

impl DueWindow {
    /// 指定時刻のタイムゾーンにおける「今日」を基準に判定期間を作る
    pub fn around<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();

        let start = start_of_day(&tz, today);
        let end = today
            .checked_add_days(Days::new(DUE_SOON_DAYS + 1))
            .map(|next| start_of_day(&tz, next) - Duration::nanoseconds(1))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Self { start, end }
    }

    /// 日時が期間内かどうか
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.start <= *instant && *instant <= self.end
    }

    /// サブスクリプションが期間内に支払予定かどうか（無効なものは常に対象外）
    pub fn includes(&self, subscription: &Subscription) -> bool {
        subscription.is_active && self.contains(&subscription.next_due_date)
    }
}

/// 期間内に支払予定の有効なサブスクリプションを支払予定日の昇順で返す
pub fn filter_upcoming(subscriptions: &[Subscription], window: &DueWindow) -> Vec<Subscription> {
    let mut upcoming: Vec<Subscription> = subscriptions
        .iter()
        .filter(|s| window.includes(s))
        .cloned()
        .collect();

    upcoming.sort_by_key(|s| s.next_due_date);
    upcoming
}

/// その日の最初の時刻をUTCで返す
///
/// 夏時間の切り替えで0時が存在しない場合は、存在する最初の時刻を探す。
fn start_of_day<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);

    (0..=4)
        .map(|step| midnight + Duration::minutes(30 * step))
        .find_map(|local| tz.from_local_datetime(&local).earliest())
        .map(|datetime| datetime.with_timezone(&Utc))
        .unwrap_or_else(|| tz.from_utc_datetime(&midnight).with_timezone(&Utc))
}

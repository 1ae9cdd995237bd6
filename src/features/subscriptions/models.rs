use crate::shared::errors::AppError;
use chrono::{DateTime, NaiveDate, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// 支払いサイクル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BillingCycle {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl BillingCycle {
    /// すべての支払いサイクル
    pub const ALL: [BillingCycle; 4] = [
        BillingCycle::Daily,
        BillingCycle::Weekly,
        BillingCycle::Monthly,
        BillingCycle::Yearly,
    ];

    /// データベースおよびJSONで使用する文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            BillingCycle::Daily => "daily",
            BillingCycle::Weekly => "weekly",
            BillingCycle::Monthly => "monthly",
            BillingCycle::Yearly => "yearly",
        }
    }
}

impl fmt::Display for BillingCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BillingCycle {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(BillingCycle::Daily),
            "weekly" => Ok(BillingCycle::Weekly),
            "monthly" => Ok(BillingCycle::Monthly),
            "yearly" => Ok(BillingCycle::Yearly),
            other => Err(AppError::validation(format!(
                "支払いサイクルは'daily'、'weekly'、'monthly'、'yearly'のいずれかである必要があります: {other}"
            ))),
        }
    }
}

impl ToSql for BillingCycle {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BillingCycle {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: AppError| FromSqlError::Other(Box::new(e)))
    }
}

/// サブスクリプションデータモデル
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Subscription {
    pub id: i64,
    pub name: String,                // サービス名、100文字以内
    pub description: Option<String>, // 未指定の場合は None（空文字列ではない）
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal, // 正の数値、小数点以下2桁
    pub billing_cycle: BillingCycle,
    pub next_due_date: DateTime<Utc>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// サブスクリプション作成用DTO
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscriptionDto {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    pub billing_cycle: BillingCycle,
    #[serde(deserialize_with = "deserialize_due_date")]
    pub next_due_date: DateTime<Utc>,
}

/// サブスクリプション更新用DTO
///
/// 指定されたフィールドのみ更新する。`description` は
/// 未指定（None）、null による削除（Some(None)）、値の設定（Some(Some(..))）を区別する。
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateSubscriptionDto {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub billing_cycle: Option<BillingCycle>,
    #[serde(default, deserialize_with = "deserialize_optional_due_date")]
    pub next_due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// 削除結果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteResult {
    pub success: bool,
}

/// 保存時の金額の小数点以下桁数（NUMERIC(10,2) 相当）
pub const PRICE_SCALE: u32 = 2;

/// 金額を保存用の精度に揃える（0.5 は 0 から遠い方向へ丸める）
pub fn normalize_price(price: Decimal) -> Decimal {
    let mut normalized =
        price.round_dp_with_strategy(PRICE_SCALE, RoundingStrategy::MidpointAwayFromZero);
    normalized.rescale(PRICE_SCALE);
    normalized
}

/// 日時を保存用の精度（マイクロ秒）に揃える
pub fn normalize_timestamp(value: DateTime<Utc>) -> DateTime<Utc> {
    value.trunc_subsecs(6)
}

/// 保存用の現在時刻
pub fn current_timestamp() -> DateTime<Utc> {
    normalize_timestamp(Utc::now())
}

/// 日時をデータベース保存用の固定幅文字列に変換する
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// 支払予定日を解析する
///
/// RFC3339 形式のほか、YYYY-MM-DD 形式（UTC の 0 時として扱う）も受け付ける。
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, AppError> {
    let value = value.trim();

    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return Ok(datetime.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| {
            AppError::validation(format!(
                "支払予定日はYYYY-MM-DDまたはRFC3339形式で入力してください: {value}"
            ))
        })
}

/// 値が存在すれば Some で包む（null は Some(None) になる）
fn deserialize_present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_due_date(&raw).map_err(serde::de::Error::custom)
}

fn deserialize_optional_due_date<'de, D>(
    deserializer: D,
) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => parse_due_date(&raw)
            .map(Some)
            .map_err(serde::de::Error::custom),
        None => Ok(None),
    }
}

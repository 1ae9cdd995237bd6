use super::models::{
    current_timestamp, format_timestamp, normalize_price, normalize_timestamp,
    CreateSubscriptionDto, Subscription, UpdateSubscriptionDto,
};
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::str::FromStr;

const SELECT_COLUMNS: &str = "SELECT id, name, description, price, billing_cycle, next_due_date, is_active, created_at, updated_at
     FROM subscriptions";

/// サブスクリプションを作成する
///
/// # 引数
/// * `conn` - データベース接続
/// * `dto` - サブスクリプション作成用DTO（検証済み）
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー
pub fn create(conn: &Connection, dto: CreateSubscriptionDto) -> AppResult<Subscription> {
    let now = format_timestamp(&current_timestamp());
    let price = normalize_price(dto.price).to_string();
    let next_due_date = format_timestamp(&normalize_timestamp(dto.next_due_date));

    // 読み戻しに失敗した行を残さない
    let tx = conn.unchecked_transaction()?;

    // is_active は入力に関係なく常に有効で作成する
    tx.execute(
        "INSERT INTO subscriptions (name, description, price, billing_cycle, next_due_date, is_active, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)",
        params![dto.name, dto.description, price, dto.billing_cycle, next_due_date, now, now],
    )?;

    let id = tx.last_insert_rowid();
    let created = find_by_id(&tx, id)?.ok_or_else(|| not_found(id))?;
    tx.commit()?;

    Ok(created)
}

/// IDでサブスクリプションを取得する
///
/// # 戻り値
/// サブスクリプション（存在しない場合は None）、または失敗時はエラー
pub fn find_by_id(conn: &Connection, id: i64) -> AppResult<Option<Subscription>> {
    let query = format!("{SELECT_COLUMNS} WHERE id = ?1");

    let subscription = conn
        .query_row(&query, params![id], map_subscription_row)
        .optional()?;

    Ok(subscription)
}

/// サブスクリプション一覧を取得する
///
/// 支払予定日の昇順、同日の場合はID順で返す。
///
/// # 引数
/// * `conn` - データベース接続
/// * `active_only` - アクティブなサブスクリプションのみを取得するか
pub fn find_all(conn: &Connection, active_only: bool) -> AppResult<Vec<Subscription>> {
    let query = if active_only {
        format!("{SELECT_COLUMNS} WHERE is_active = 1 ORDER BY next_due_date ASC, id ASC")
    } else {
        format!("{SELECT_COLUMNS} ORDER BY next_due_date ASC, id ASC")
    };

    let mut stmt = conn.prepare(&query)?;
    let subscriptions = stmt.query_map([], map_subscription_row)?;

    subscriptions
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| AppError::Database(e.to_string()))
}

/// サブスクリプションを更新する
///
/// DTOで指定されたフィールドのみ変更し、updated_at は常に更新する。
///
/// # 戻り値
/// 更新されたサブスクリプション、存在しない場合は NotFound エラー
pub fn update(conn: &Connection, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription> {
    let existing = find_by_id(conn, id)?.ok_or_else(|| not_found(id))?;

    // 更新するフィールドを決定
    let name = dto.name.unwrap_or(existing.name);
    let description = dto.description.unwrap_or(existing.description);
    let price = dto.price.map(normalize_price).unwrap_or(existing.price);
    let billing_cycle = dto.billing_cycle.unwrap_or(existing.billing_cycle);
    let next_due_date = dto
        .next_due_date
        .map(normalize_timestamp)
        .unwrap_or(existing.next_due_date);
    let is_active = dto.is_active.unwrap_or(existing.is_active);

    // 前回の updated_at より過去にならないようにする
    let now = current_timestamp().max(existing.updated_at);

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "UPDATE subscriptions
         SET name = ?1, description = ?2, price = ?3, billing_cycle = ?4, next_due_date = ?5, is_active = ?6, updated_at = ?7
         WHERE id = ?8",
        params![
            name,
            description,
            price.to_string(),
            billing_cycle,
            format_timestamp(&next_due_date),
            is_active,
            format_timestamp(&now),
            id
        ],
    )?;

    let updated = find_by_id(&tx, id)?.ok_or_else(|| not_found(id))?;
    tx.commit()?;

    Ok(updated)
}

/// サブスクリプションのアクティブ状態を切り替える
pub fn toggle_status(conn: &Connection, id: i64) -> AppResult<Subscription> {
    let now = format_timestamp(&current_timestamp());

    let rows_affected = conn.execute(
        "UPDATE subscriptions SET is_active = NOT is_active, updated_at = MAX(updated_at, ?1) WHERE id = ?2",
        params![now, id],
    )?;

    if rows_affected == 0 {
        return Err(not_found(id));
    }

    find_by_id(conn, id)?.ok_or_else(|| not_found(id))
}

/// サブスクリプションを削除する
///
/// # 戻り値
/// 成功時はOk(())、存在しない場合は NotFound エラー
pub fn delete(conn: &Connection, id: i64) -> AppResult<()> {
    let rows_affected = conn.execute("DELETE FROM subscriptions WHERE id = ?1", params![id])?;

    if rows_affected == 0 {
        return Err(not_found(id));
    }

    Ok(())
}

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("ID {id} のサブスクリプション"))
}

fn map_subscription_row(row: &Row<'_>) -> rusqlite::Result<Subscription> {
    Ok(Subscription {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: decimal_column(row, 3)?,
        billing_cycle: row.get(4)?,
        next_due_date: timestamp_column(row, 5)?,
        is_active: row.get::<_, i64>(6)? != 0,
        created_at: timestamp_column(row, 7)?,
        updated_at: timestamp_column(row, 8)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let text: String = row.get(idx)?;
    Decimal::from_str(&text)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&text)
        .map(|datetime| datetime.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

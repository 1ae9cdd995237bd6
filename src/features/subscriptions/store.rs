use super::models::{CreateSubscriptionDto, Subscription, UpdateSubscriptionDto};
use super::repository;
use crate::shared::errors::{AppError, AppResult};
use rusqlite::Connection;
use std::sync::{Mutex, MutexGuard};

/// サブスクリプションの永続化インターフェース
///
/// ビジネスロジックは持たない。入力の検証はコマンド層で済んでいる前提。
pub trait SubscriptionStore: Send + Sync {
    /// 新規作成する。is_active は常に true、ID とタイムスタンプはストアが割り当てる。
    fn insert(&self, dto: CreateSubscriptionDto) -> AppResult<Subscription>;

    /// IDで取得する。存在しない場合は None。
    fn find_by_id(&self, id: i64) -> AppResult<Option<Subscription>>;

    /// 支払予定日の昇順（同日はID順）で一覧を返す。
    fn find_all(&self, active_only: bool) -> AppResult<Vec<Subscription>>;

    /// 指定フィールドのみ更新し、updated_at を必ず進める。存在しない場合は NotFound。
    fn update(&self, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription>;

    /// アクティブ状態を反転する。存在しない場合は NotFound。
    fn toggle_status(&self, id: i64) -> AppResult<Subscription>;

    /// 物理削除する。存在しない場合は NotFound。
    fn delete(&self, id: i64) -> AppResult<()>;
}

/// SQLiteをバックエンドとするストア
pub struct SqliteSubscriptionStore {
    db: Mutex<Connection>,
}

impl SqliteSubscriptionStore {
    /// テーブル作成済みの接続から生成する
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// テスト・一時利用向けのインメモリデータベースで生成する
    pub fn open_in_memory() -> AppResult<Self> {
        let conn = Connection::open_in_memory()?;
        crate::shared::database::create_tables(&conn)?;
        Ok(Self::new(conn))
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.db
            .lock()
            .map_err(|e| AppError::concurrency(format!("データベースロックエラー: {e}")))
    }
}

impl SubscriptionStore for SqliteSubscriptionStore {
    fn insert(&self, dto: CreateSubscriptionDto) -> AppResult<Subscription> {
        let conn = self.conn()?;
        repository::create(&conn, dto)
    }

    fn find_by_id(&self, id: i64) -> AppResult<Option<Subscription>> {
        let conn = self.conn()?;
        repository::find_by_id(&conn, id)
    }

    fn find_all(&self, active_only: bool) -> AppResult<Vec<Subscription>> {
        let conn = self.conn()?;
        repository::find_all(&conn, active_only)
    }

    fn update(&self, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription> {
        let conn = self.conn()?;
        repository::update(&conn, id, dto)
    }

    fn toggle_status(&self, id: i64) -> AppResult<Subscription> {
        let conn = self.conn()?;
        repository::toggle_status(&conn, id)
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        let conn = self.conn()?;
        repository::delete(&conn, id)
    }
}

// 機能モジュール構造
pub mod features;
pub mod shared;

use features::spending::{self, SpendingSummary};
use features::subscriptions::{SqliteSubscriptionStore, Subscription};
use log::{error, info};
use serde::Serialize;
use shared::config::environment::{
    initialize_logging_system, load_environment_variables, EnvironmentConfig,
};
use shared::config::initialization::{initialize_application, log_initialization_complete};
use shared::errors::AppResult;

/// アプリケーション状態（サブスクリプションストアを保持）
pub struct AppState {
    pub store: SqliteSubscriptionStore,
}

impl AppState {
    /// 環境設定からデータベースを開いて状態を作る
    pub fn open(config: &EnvironmentConfig) -> AppResult<Self> {
        let init_result = initialize_application(config)?;

        let conn = shared::database::initialize_database(&init_result.database_path)
            .inspect_err(|e| error!("データベース初期化失敗: {e}"))?;

        log_initialization_complete(&init_result);

        Ok(Self {
            store: SqliteSubscriptionStore::new(conn),
        })
    }
}

/// 起動時に出力するレポート
#[derive(Debug, Serialize)]
pub struct StartupReport {
    pub summary: SpendingSummary,
    pub upcoming: Vec<Subscription>,
}

/// 現在の支出サマリーと支払予定の近いサブスクリプションをまとめる
pub fn build_startup_report(state: &AppState) -> AppResult<StartupReport> {
    Ok(StartupReport {
        summary: spending::get_spending_summary(&state.store)?,
        upcoming: spending::get_upcoming_subscriptions(&state.store)?,
    })
}

pub fn run() -> AppResult<()> {
    // 環境に応じた.envファイルを読み込み（ログシステム初期化前に実行）
    load_environment_variables();
    initialize_logging_system();

    info!("アプリケーション初期化を開始します...");

    let config = EnvironmentConfig::from_env();
    let state = AppState::open(&config)?;

    let report = build_startup_report(&state)?;
    info!(
        "有効なサブスクリプション: {}件, 7日以内の支払予定: {}件",
        report.summary.active_subscriptions_count, report.summary.upcoming_due_count
    );

    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}

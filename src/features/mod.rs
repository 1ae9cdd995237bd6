/// 機能別モジュール
pub mod spending;
pub mod subscriptions;

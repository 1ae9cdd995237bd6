/// サブスクリプション機能モジュール
///
/// このモジュールは、サブスクリプション管理に関連する機能を提供します：
/// - サブスクリプションの作成、読み取り、更新、削除
/// - サブスクリプションの有効/無効切り替え
/// - 永続化インターフェース（SQLite版とインメモリ版）
pub mod commands;
pub mod memory_store;
pub mod models;
pub mod repository;
pub mod store;

// 公開インターフェース
pub use commands::{
    create_subscription, delete_subscription, get_subscription, get_subscriptions,
    toggle_subscription_status, update_subscription,
};

pub use memory_store::InMemorySubscriptionStore;
pub use models::{
    BillingCycle, CreateSubscriptionDto, DeleteResult, Subscription, UpdateSubscriptionDto,
};
pub use store::{SqliteSubscriptionStore, SubscriptionStore};

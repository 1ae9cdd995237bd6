use super::models::{
    current_timestamp, normalize_price, normalize_timestamp, CreateSubscriptionDto, Subscription,
    UpdateSubscriptionDto,
};
use super::store::SubscriptionStore;
use crate::shared::errors::{AppError, AppResult};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// メモリ上にデータを保持するストア
///
/// SQLite版と同じ振る舞いをする。テストや埋め込み用途向け。
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    state: Mutex<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    rows: BTreeMap<i64, Subscription>,
}

impl InMemorySubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|e| AppError::concurrency(format!("ストアロックエラー: {e}")))
    }
}

fn not_found(id: i64) -> AppError {
    AppError::not_found(format!("ID {id} のサブスクリプション"))
}

impl SubscriptionStore for InMemorySubscriptionStore {
    fn insert(&self, dto: CreateSubscriptionDto) -> AppResult<Subscription> {
        let mut state = self.state()?;
        let now = current_timestamp();

        // AUTOINCREMENT と同じく、削除されたIDは再利用しない
        state.last_id += 1;
        let subscription = Subscription {
            id: state.last_id,
            name: dto.name,
            description: dto.description,
            price: normalize_price(dto.price),
            billing_cycle: dto.billing_cycle,
            next_due_date: normalize_timestamp(dto.next_due_date),
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.rows.insert(subscription.id, subscription.clone());

        Ok(subscription)
    }

    fn find_by_id(&self, id: i64) -> AppResult<Option<Subscription>> {
        Ok(self.state()?.rows.get(&id).cloned())
    }

    fn find_all(&self, active_only: bool) -> AppResult<Vec<Subscription>> {
        let state = self.state()?;
        let mut subscriptions: Vec<Subscription> = state
            .rows
            .values()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect();

        // BTreeMap はID順なので安定ソートで同日はID順になる
        subscriptions.sort_by_key(|s| s.next_due_date);
        Ok(subscriptions)
    }

    fn update(&self, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription> {
        let mut state = self.state()?;
        let existing = state.rows.get_mut(&id).ok_or_else(|| not_found(id))?;

        if let Some(name) = dto.name {
            existing.name = name;
        }
        if let Some(description) = dto.description {
            existing.description = description;
        }
        if let Some(price) = dto.price {
            existing.price = normalize_price(price);
        }
        if let Some(billing_cycle) = dto.billing_cycle {
            existing.billing_cycle = billing_cycle;
        }
        if let Some(next_due_date) = dto.next_due_date {
            existing.next_due_date = normalize_timestamp(next_due_date);
        }
        if let Some(is_active) = dto.is_active {
            existing.is_active = is_active;
        }
        existing.updated_at = current_timestamp().max(existing.updated_at);

        Ok(existing.clone())
    }

    fn toggle_status(&self, id: i64) -> AppResult<Subscription> {
        let mut state = self.state()?;
        let existing = state.rows.get_mut(&id).ok_or_else(|| not_found(id))?;

        existing.is_active = !existing.is_active;
        existing.updated_at = current_timestamp().max(existing.updated_at);

        Ok(existing.clone())
    }

    fn delete(&self, id: i64) -> AppResult<()> {
        self.state()?
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| not_found(id))
    }
}

use super::models::{
    normalize_price, CreateSubscriptionDto, DeleteResult, Subscription, UpdateSubscriptionDto,
};
use super::store::SubscriptionStore;
use crate::shared::errors::{AppError, AppResult};
use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;

/// サービス名の最大文字数
const MAX_NAME_LENGTH: usize = 100;

/// 金額の上限（NUMERIC(10,2) に収まる最大値 99,999,999.99）
fn max_price() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// 支払予定日として受け付ける年の範囲（RFC3339 の4桁年で表せる範囲）
const DUE_DATE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

/// サブスクリプションを作成する
///
/// # 引数
/// * `store` - サブスクリプションストア
/// * `dto` - サブスクリプション作成用DTO
///
/// # 戻り値
/// 作成されたサブスクリプション、または失敗時はエラー（入力不正は Validation）
pub fn create_subscription<S: SubscriptionStore>(
    store: &S,
    dto: CreateSubscriptionDto,
) -> AppResult<Subscription> {
    validate_create_subscription_dto(&dto).inspect_err(|e| {
        log::warn!("サブスクリプション作成の入力が不正です: {e}");
    })?;

    let subscription = store.insert(dto)?;
    log::info!(
        "サブスクリプションを作成しました: id={}, name={}",
        subscription.id,
        subscription.name
    );

    Ok(subscription)
}

/// IDでサブスクリプションを取得する
///
/// 存在しない場合はエラーではなく None を返す。
pub fn get_subscription<S: SubscriptionStore>(
    store: &S,
    id: i64,
) -> AppResult<Option<Subscription>> {
    let subscription = store.find_by_id(id)?;
    log::debug!("サブスクリプション取得: id={id}, found={}", subscription.is_some());
    Ok(subscription)
}

/// サブスクリプション一覧を取得する（有効・無効の両方、支払予定日の昇順）
pub fn get_subscriptions<S: SubscriptionStore>(store: &S) -> AppResult<Vec<Subscription>> {
    let subscriptions = store.find_all(false)?;
    log::debug!("サブスクリプション一覧を取得しました: {}件", subscriptions.len());
    Ok(subscriptions)
}

/// サブスクリプションを更新する
///
/// # 引数
/// * `store` - サブスクリプションストア
/// * `id` - サブスクリプションID
/// * `dto` - サブスクリプション更新用DTO（指定されたフィールドのみ更新）
///
/// # 戻り値
/// 更新されたサブスクリプション、存在しない場合は NotFound エラー
pub fn update_subscription<S: SubscriptionStore>(
    store: &S,
    id: i64,
    dto: UpdateSubscriptionDto,
) -> AppResult<Subscription> {
    validate_update_subscription_dto(&dto).inspect_err(|e| {
        log::warn!("サブスクリプション更新の入力が不正です: id={id}, {e}");
    })?;

    let subscription = store.update(id, dto).inspect_err(|e| {
        if e.is_not_found() {
            log::warn!("更新対象のサブスクリプションが存在しません: id={id}");
        }
    })?;
    log::info!("サブスクリプションを更新しました: id={id}");

    Ok(subscription)
}

/// サブスクリプションのアクティブ状態を切り替える
pub fn toggle_subscription_status<S: SubscriptionStore>(
    store: &S,
    id: i64,
) -> AppResult<Subscription> {
    let subscription = store.toggle_status(id)?;
    log::info!(
        "サブスクリプションの状態を切り替えました: id={id}, is_active={}",
        subscription.is_active
    );
    Ok(subscription)
}

/// サブスクリプションを削除する
///
/// # 戻り値
/// 成功時は `{ success: true }`、存在しない場合は NotFound エラー
pub fn delete_subscription<S: SubscriptionStore>(store: &S, id: i64) -> AppResult<DeleteResult> {
    store.delete(id).inspect_err(|e| {
        if e.is_not_found() {
            log::warn!("削除対象のサブスクリプションが存在しません: id={id}");
        }
    })?;
    log::info!("サブスクリプションを削除しました: id={id}");

    Ok(DeleteResult { success: true })
}

/// サブスクリプション作成DTOのバリデーション
fn validate_create_subscription_dto(dto: &CreateSubscriptionDto) -> AppResult<()> {
    validate_name(&dto.name)?;
    validate_price(dto.price)?;
    validate_due_date(&dto.next_due_date)?;
    Ok(())
}

/// サブスクリプション更新DTOのバリデーション
fn validate_update_subscription_dto(dto: &UpdateSubscriptionDto) -> AppResult<()> {
    if let Some(ref name) = dto.name {
        validate_name(name)?;
    }
    if let Some(price) = dto.price {
        validate_price(price)?;
    }
    if let Some(ref next_due_date) = dto.next_due_date {
        validate_due_date(next_due_date)?;
    }
    Ok(())
}

/// サービス名は必須かつ100文字以内
fn validate_name(name: &str) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("サービス名を入力してください"));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::validation(format!(
            "サービス名は{MAX_NAME_LENGTH}文字以内で入力してください"
        )));
    }

    Ok(())
}

/// 金額は正の数値かつ10桁以内（保存精度に丸めた後も正であること）
fn validate_price(price: Decimal) -> AppResult<()> {
    if price <= Decimal::ZERO {
        return Err(AppError::validation("金額は正の数値である必要があります"));
    }

    let normalized = normalize_price(price);
    if normalized > max_price() {
        return Err(AppError::validation("金額は10桁以内で入力してください"));
    }
    if normalized <= Decimal::ZERO {
        return Err(AppError::validation("金額は0.01以上で入力してください"));
    }

    Ok(())
}

/// 支払予定日は西暦0年から9999年まで
fn validate_due_date(next_due_date: &DateTime<Utc>) -> AppResult<()> {
    if !DUE_DATE_YEARS.contains(&next_due_date.year()) {
        return Err(AppError::validation(format!(
            "支払予定日は{}年から{}年の範囲で入力してください",
            DUE_DATE_YEARS.start(),
            DUE_DATE_YEARS.end()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::subscriptions::memory_store::InMemorySubscriptionStore;
    use crate::features::subscriptions::models::BillingCycle;
    use crate::features::subscriptions::store::SqliteSubscriptionStore;
    use chrono::{TimeZone, Utc};

    fn dto(name: &str, price: Decimal) -> CreateSubscriptionDto {
        CreateSubscriptionDto {
            name: name.to_string(),
            description: None,
            price,
            billing_cycle: BillingCycle::Monthly,
            next_due_date: Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap(),
        }
    }

    /// 両ストアで同じ振る舞いになることを確認するためのヘルパー
    fn for_each_store(check: impl Fn(&dyn ErasedStore)) {
        check(&SqliteSubscriptionStore::open_in_memory().unwrap());
        check(&InMemorySubscriptionStore::new());
    }

    /// ジェネリック関数をテストから呼ぶための薄いラッパー
    trait ErasedStore {
        fn create(&self, dto: CreateSubscriptionDto) -> AppResult<Subscription>;
        fn get(&self, id: i64) -> AppResult<Option<Subscription>>;
        fn list(&self) -> AppResult<Vec<Subscription>>;
        fn update(&self, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription>;
        fn delete(&self, id: i64) -> AppResult<DeleteResult>;
    }

    impl<S: SubscriptionStore> ErasedStore for S {
        fn create(&self, dto: CreateSubscriptionDto) -> AppResult<Subscription> {
            create_subscription(self, dto)
        }
        fn get(&self, id: i64) -> AppResult<Option<Subscription>> {
            get_subscription(self, id)
        }
        fn list(&self) -> AppResult<Vec<Subscription>> {
            get_subscriptions(self)
        }
        fn update(&self, id: i64, dto: UpdateSubscriptionDto) -> AppResult<Subscription> {
            update_subscription(self, id, dto)
        }
        fn delete(&self, id: i64) -> AppResult<DeleteResult> {
            delete_subscription(self, id)
        }
    }

    #[test]
    fn test_create_forces_active_and_keeps_missing_description() {
        for_each_store(|store| {
            let created = store.create(dto("Netflix", Decimal::new(1599, 2))).unwrap();

            assert!(created.is_active);
            assert_eq!(created.description, None);
            assert!(created.created_at <= created.updated_at);
        });
    }

    #[test]
    fn test_create_rejects_invalid_input() {
        for_each_store(|store| {
            let empty_name = store.create(dto("   ", Decimal::ONE)).unwrap_err();
            assert!(empty_name.is_validation());

            let long_name = store.create(dto(&"あ".repeat(101), Decimal::ONE)).unwrap_err();
            assert!(long_name.is_validation());

            let zero_price = store.create(dto("Zero", Decimal::ZERO)).unwrap_err();
            assert!(zero_price.is_validation());

            let negative_price = store.create(dto("Negative", Decimal::new(-1, 0))).unwrap_err();
            assert!(negative_price.is_validation());

            let too_small = store.create(dto("Tiny", Decimal::new(1, 3))).unwrap_err();
            assert!(too_small.is_validation());

            let too_large = store.create(dto("Huge", Decimal::new(10_000_000_000, 2))).unwrap_err();
            assert!(too_large.is_validation());

            // 不正な入力では何も保存されない
            assert!(store.list().unwrap().is_empty());
        });
    }

    #[test]
    fn test_name_of_exactly_max_length_is_accepted() {
        let store = InMemorySubscriptionStore::new();
        let created = create_subscription(&store, dto(&"a".repeat(MAX_NAME_LENGTH), Decimal::ONE));
        assert!(created.is_ok());
    }

    #[test]
    fn test_get_missing_returns_none_not_error() {
        for_each_store(|store| {
            assert_eq!(store.get(12345).unwrap(), None);
        });
    }

    #[test]
    fn test_update_name_only_keeps_other_fields() {
        for_each_store(|store| {
            let created = store.create(dto("Before", Decimal::new(999, 2))).unwrap();

            let updated = store
                .update(
                    created.id,
                    UpdateSubscriptionDto {
                        name: Some("After".to_string()),
                        ..Default::default()
                    },
                )
                .unwrap();

            assert_eq!(updated.name, "After");
            assert_eq!(updated.price, created.price);
            assert_eq!(updated.billing_cycle, created.billing_cycle);
            assert_eq!(updated.next_due_date, created.next_due_date);
            assert_eq!(updated.is_active, created.is_active);
            assert!(updated.updated_at >= created.updated_at);
        });
    }

    #[test]
    fn test_empty_update_still_touches_updated_at() {
        for_each_store(|store| {
            let created = store.create(dto("Touch", Decimal::ONE)).unwrap();

            let updated = store.update(created.id, UpdateSubscriptionDto::default()).unwrap();

            assert_eq!(updated.name, created.name);
            assert!(updated.updated_at >= created.updated_at);
            assert_eq!(updated.created_at, created.created_at);
        });
    }

    #[test]
    fn test_update_validates_and_reports_missing() {
        for_each_store(|store| {
            let created = store.create(dto("Valid", Decimal::ONE)).unwrap();

            let invalid = store
                .update(
                    created.id,
                    UpdateSubscriptionDto {
                        price: Some(Decimal::new(-5, 0)),
                        ..Default::default()
                    },
                )
                .unwrap_err();
            assert!(invalid.is_validation());
            assert_eq!(store.get(created.id).unwrap().unwrap().price, created.price);

            let missing = store.update(9999, UpdateSubscriptionDto::default()).unwrap_err();
            assert!(missing.is_not_found());
        });
    }

    #[test]
    fn test_delete_then_get_returns_none() {
        for_each_store(|store| {
            let created = store.create(dto("Gone", Decimal::ONE)).unwrap();

            assert_eq!(store.delete(created.id).unwrap(), DeleteResult { success: true });
            assert_eq!(store.get(created.id).unwrap(), None);

            let error = store.delete(created.id).unwrap_err();
            assert!(error.is_not_found());
        });
    }

    #[test]
    fn test_deleted_ids_are_not_reused() {
        for_each_store(|store| {
            let first = store.create(dto("First", Decimal::ONE)).unwrap();
            store.delete(first.id).unwrap();

            let second = store.create(dto("Second", Decimal::ONE)).unwrap();
            assert!(second.id > first.id);
        });
    }

    #[test]
    fn test_due_date_outside_supported_years_is_rejected() {
        for_each_store(|store| {
            let mut far_future = dto("Far", Decimal::ONE);
            far_future.next_due_date = Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap();
            assert!(store.create(far_future).unwrap_err().is_validation());

            let mut before_year_zero = dto("Ancient", Decimal::ONE);
            before_year_zero.next_due_date = Utc.with_ymd_and_hms(-1, 12, 31, 0, 0, 0).unwrap();
            assert!(store.create(before_year_zero).unwrap_err().is_validation());

            // 拒否された後も一覧は読める
            assert!(store.list().unwrap().is_empty());

            let mut last_year = dto("Edge", Decimal::ONE);
            last_year.next_due_date = Utc.with_ymd_and_hms(9999, 12, 31, 23, 59, 59).unwrap();
            let created = store.create(last_year).unwrap();
            assert_eq!(store.get(created.id).unwrap(), Some(created));
        });
    }

    #[test]
    fn test_rejected_due_date_update_keeps_record() {
        for_each_store(|store| {
            let created = store.create(dto("Keep", Decimal::new(500, 2))).unwrap();

            let error = store
                .update(
                    created.id,
                    UpdateSubscriptionDto {
                        name: Some("Changed".to_string()),
                        next_due_date: Some(Utc.with_ymd_and_hms(10000, 1, 1, 0, 0, 0).unwrap()),
                        ..Default::default()
                    },
                )
                .unwrap_err();
            assert!(error.is_validation());

            assert_eq!(store.get(created.id).unwrap(), Some(created.clone()));
            assert_eq!(store.list().unwrap(), vec![created]);
        });
    }

    #[test]
    fn test_toggle_subscription_status() {
        let store = InMemorySubscriptionStore::new();
        let created = create_subscription(&store, dto("Toggle", Decimal::ONE)).unwrap();

        let toggled = toggle_subscription_status(&store, created.id).unwrap();
        assert!(!toggled.is_active);

        assert!(toggle_subscription_status(&store, 404).unwrap_err().is_not_found());
    }
}

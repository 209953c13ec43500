//! Tests for aggregation, write-back routing and partition sessions.

#[cfg(test)]
mod tests {
    use crate::errors::{DatabaseError, Error, Result};
    use crate::fx::RateTable;
    use crate::ledger::{
        Aggregator, LedgerService, LedgerServiceTrait, PartitionSession, SaveOutcome,
        SessionState, ViewContext, WriteBackRouter,
    };
    use crate::partitions::{
        storage_key, InMemoryPartitionRepository, LedgerFamily, PartitionInfo, PartitionKey,
        PartitionRepositoryTrait, TopologyRegistry,
    };
    use crate::records::{
        CapitalDetails, LedgerRecord, LedgerRecordUpdate, NewLedgerRecord, PartitionStore,
        RecordDetails,
    };
    use crate::settings::{LedgerSettings, LedgerSettingsUpdate, SettingsServiceTrait};
    use crate::tabs::TabResolver;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    // ==================== Test doubles ====================

    /// In-memory repository that can be told to fail writes and counts them.
    #[derive(Default)]
    struct FlakyRepository {
        inner: InMemoryPartitionRepository,
        fail_writes: AtomicBool,
        writes: AtomicUsize,
    }

    #[async_trait]
    impl PartitionRepositoryTrait for FlakyRepository {
        fn get_payload(&self, storage_key: &str) -> Result<Option<String>> {
            self.inner.get_payload(storage_key)
        }

        async fn put_payload(
            &self,
            family: LedgerFamily,
            partition: &PartitionKey,
            storage_key: &str,
            payload: String,
        ) -> Result<()> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(Error::Database(DatabaseError::QueryFailed(
                    "disk full".to_string(),
                )));
            }
            self.writes.fetch_add(1, Ordering::SeqCst);
            self.inner
                .put_payload(family, partition, storage_key, payload)
                .await
        }

        fn list_partitions(&self, family: LedgerFamily) -> Result<Vec<PartitionInfo>> {
            self.inner.list_partitions(family)
        }
    }

    struct FixedSettings(LedgerSettings);

    #[async_trait]
    impl SettingsServiceTrait for FixedSettings {
        fn get_settings(&self) -> Result<LedgerSettings> {
            Ok(self.0.clone())
        }

        fn get_base_currency(&self) -> Result<String> {
            Ok(self.0.base_currency.clone())
        }

        fn get_rate_table(&self) -> Result<RateTable> {
            Ok(self.0.exchange_rates.clone())
        }

        async fn update_settings(&self, _update: LedgerSettingsUpdate) -> Result<LedgerSettings> {
            Ok(self.0.clone())
        }

        async fn set_exchange_rate(
            &self,
            _currency: &str,
            _rate: Decimal,
        ) -> Result<LedgerSettings> {
            Ok(self.0.clone())
        }
    }

    // ==================== Fixtures ====================

    fn payable() -> PartitionKey {
        PartitionKey::new("payable", "Capital")
    }

    fn kenya() -> PartitionKey {
        PartitionKey::new("kenya", "Capital")
    }

    fn madagascar() -> PartitionKey {
        PartitionKey::new("madagascar", "Capital")
    }

    fn settings() -> LedgerSettings {
        LedgerSettings {
            base_currency: "LKR".to_string(),
            exchange_rates: RateTable::new().with_rate("USD", dec!(302.5)).unwrap(),
        }
    }

    fn capital_form(
        code: &str,
        amount: Decimal,
        currency: &str,
        rate: Option<Decimal>,
    ) -> NewLedgerRecord {
        NewLedgerRecord {
            id: None,
            date: NaiveDate::from_ymd_opt(2024, 5, 2).unwrap(),
            code: code.to_string(),
            amount,
            currency: currency.to_string(),
            exchange_rate: rate,
            details: RecordDetails::Capital(CapitalDetails {
                vendor: "Ratnapura Gem Co".to_string(),
                ..Default::default()
            }),
        }
    }

    fn record_in(
        partition: &PartitionKey,
        code: &str,
        amount: Decimal,
        currency: &str,
    ) -> LedgerRecord {
        let s = settings();
        capital_form(code, amount, currency, None)
            .into_record(partition, &s.base_currency, &s.exchange_rates)
            .unwrap()
    }

    async fn seed(
        repository: &Arc<FlakyRepository>,
        partition: &PartitionKey,
        records: &[LedgerRecord],
    ) {
        PartitionStore::new(repository.clone())
            .save(LedgerFamily::Capital, partition, records)
            .await
            .unwrap();
    }

    fn service(repository: Arc<FlakyRepository>) -> LedgerService {
        LedgerService::new(
            repository,
            TabResolver::new(Arc::new(TopologyRegistry::builtin())),
            Arc::new(FixedSettings(settings())),
        )
    }

    fn stored(repository: &Arc<FlakyRepository>, partition: &PartitionKey) -> Vec<LedgerRecord> {
        PartitionStore::new(repository.clone())
            .load(LedgerFamily::Capital, partition)
            .unwrap()
    }

    // ==================== Scenarios ====================

    #[tokio::test]
    async fn test_mother_tab_shows_foreign_record_with_origin() {
        let repository = Arc::new(FlakyRepository::default());
        let usd = {
            let s = settings();
            capital_form("KC-100", dec!(100), "USD", Some(dec!(302.5)))
                .into_record(&kenya(), &s.base_currency, &s.exchange_rates)
                .unwrap()
        };
        seed(&repository, &kenya(), &[usd]).await;

        let view = service(repository).open_view(LedgerFamily::Capital, &payable()).unwrap();
        assert!(view.context.is_aggregate);
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].converted_amount, Some(dec!(30250)));
        assert_eq!(view.records[0].source_module, "kenya");
        assert_eq!(view.records[0].source_tab, "Capital");
        assert_eq!(view.summary.total_base, dec!(30250));
    }

    #[tokio::test]
    async fn test_edit_from_mother_tab_writes_back_to_origin() {
        let repository = Arc::new(FlakyRepository::default());
        let usd = record_in(&kenya(), "KC-100", dec!(100), "USD");
        seed(&repository, &kenya(), &[usd.clone()]).await;
        let service = service(repository.clone());

        let view = service
            .update_record(
                LedgerFamily::Capital,
                &payable(),
                LedgerRecordUpdate {
                    id: usd.id.clone(),
                    amount: Some(dec!(200)),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].converted_amount, Some(dec!(60500)));

        let kenya_records = stored(&repository, &kenya());
        assert_eq!(kenya_records[0].amount, dec!(200));
        assert_eq!(kenya_records[0].converted_amount, Some(dec!(60500)));
        assert!(repository
            .get_payload(&storage_key(LedgerFamily::Capital, &payable()))
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_new_record_from_mother_tab_lands_in_mother_partition() {
        let repository = Arc::new(FlakyRepository::default());
        seed(&repository, &kenya(), &[record_in(&kenya(), "KC-1", dec!(5), "LKR")]).await;
        let service = service(repository.clone());

        let view = service
            .create_record(
                LedgerFamily::Capital,
                &payable(),
                capital_form("PC-1", dec!(750), "LKR", None),
            )
            .await
            .unwrap();

        assert_eq!(view.records.len(), 2);
        assert_eq!(stored(&repository, &payable()).len(), 1);
        assert_eq!(stored(&repository, &kenya()).len(), 1);
        assert_eq!(view.records[1].origin(), payable());
    }

    #[tokio::test]
    async fn test_delete_from_mother_tab_removes_from_origin_only() {
        let repository = Arc::new(FlakyRepository::default());
        let kept = record_in(&kenya(), "KC-1", dec!(1), "LKR");
        let doomed = record_in(&madagascar(), "MC-1", dec!(2), "LKR");
        seed(&repository, &kenya(), &[kept.clone()]).await;
        seed(&repository, &madagascar(), &[doomed.clone()]).await;
        let service = service(repository.clone());

        let view = service
            .delete_record(LedgerFamily::Capital, &payable(), &doomed.id)
            .await
            .unwrap();

        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].id, kept.id);
        assert!(stored(&repository, &madagascar()).is_empty());
        assert_eq!(stored(&repository, &kenya()).len(), 1);
    }

    #[tokio::test]
    async fn test_native_view_only_sees_its_own_records() {
        let repository = Arc::new(FlakyRepository::default());
        seed(&repository, &kenya(), &[record_in(&kenya(), "KC-1", dec!(1), "LKR")]).await;
        seed(&repository, &madagascar(), &[record_in(&madagascar(), "MC-1", dec!(2), "LKR")]).await;

        let view = service(repository)
            .open_view(LedgerFamily::Capital, &kenya())
            .unwrap();
        assert!(!view.context.is_aggregate);
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.records[0].code, "KC-1");
    }

    #[tokio::test]
    async fn test_tab_spelling_variants_share_a_partition() {
        let repository = Arc::new(FlakyRepository::default());
        let service = service(repository.clone());

        service
            .create_record(
                LedgerFamily::Capital,
                &PartitionKey::new("Kenya", " capital "),
                capital_form("KC-1", dec!(1), "LKR", None),
            )
            .await
            .unwrap();

        assert_eq!(stored(&repository, &kenya()).len(), 1);
        let view = service.open_view(LedgerFamily::Capital, &payable()).unwrap();
        assert_eq!(view.records.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_record_is_not_found() {
        let repository = Arc::new(FlakyRepository::default());
        let err = service(repository)
            .delete_record(LedgerFamily::Capital, &payable(), "nope")
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_create_rejects_wrong_family_details() {
        let repository = Arc::new(FlakyRepository::default());
        let err = service(repository)
            .create_record(
                LedgerFamily::Expense,
                &PartitionKey::new("kenya", "Expenses"),
                capital_form("KC-1", dec!(1), "LKR", None),
            )
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_create_rejects_id_already_visible_in_view() {
        let repository = Arc::new(FlakyRepository::default());
        let existing = record_in(&kenya(), "KC-1", dec!(1), "LKR");
        seed(&repository, &kenya(), &[existing.clone()]).await;

        let mut form = capital_form("PC-1", dec!(1), "LKR", None);
        form.id = Some(existing.id.clone());
        let err = service(repository.clone())
            .create_record(LedgerFamily::Capital, &payable(), form)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(stored(&repository, &payable()).is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_id_taken_by_sibling_partition() {
        let repository = Arc::new(FlakyRepository::default());
        let service = service(repository.clone());

        let mut first = capital_form("KC-1", dec!(1), "LKR", None);
        first.id = Some("X1".to_string());
        service
            .create_record(LedgerFamily::Capital, &kenya(), first)
            .await
            .unwrap();

        // Madagascar's own view cannot see Kenya's records.
        let mut second = capital_form("MC-1", dec!(2), "LKR", None);
        second.id = Some("X1".to_string());
        let err = service
            .create_record(LedgerFamily::Capital, &madagascar(), second)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert!(err.to_string().contains("kenya/Capital"));
        assert!(stored(&repository, &madagascar()).is_empty());

        let view = service.open_view(LedgerFamily::Capital, &payable()).unwrap();
        assert_eq!(view.records.len(), 1);
        assert_eq!(view.summary.counts_by_origin.get("kenya/Capital"), Some(&1));
    }

    #[tokio::test]
    async fn test_create_with_unconvertible_amount_is_rejected() {
        let repository = Arc::new(FlakyRepository::default());
        let err = service(repository.clone())
            .create_record(
                LedgerFamily::Capital,
                &kenya(),
                capital_form("KC-1", Decimal::MAX / dec!(2), "USD", Some(dec!(302.5))),
            )
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(repository.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_summary_of_extreme_amounts_does_not_overflow() {
        let repository = Arc::new(FlakyRepository::default());
        seed(&repository, &kenya(), &[record_in(&kenya(), "KC-1", Decimal::MAX, "LKR")]).await;
        seed(
            &repository,
            &madagascar(),
            &[record_in(&madagascar(), "MC-1", Decimal::MAX, "LKR")],
        )
        .await;

        let view = service(repository)
            .open_view(LedgerFamily::Capital, &payable())
            .unwrap();
        assert_eq!(view.summary.record_count, 2);
        assert_eq!(view.summary.total_base, Decimal::MAX);
        assert_eq!(view.summary.unconverted_count, 1);
        assert_eq!(view.summary.totals_by_currency.get("LKR"), Some(&Decimal::MAX));
    }

    // ==================== Failure semantics ====================

    #[tokio::test]
    async fn test_failed_save_leaves_storage_untouched() {
        let repository = Arc::new(FlakyRepository::default());
        let usd = record_in(&kenya(), "KC-100", dec!(100), "USD");
        seed(&repository, &kenya(), &[usd.clone()]).await;
        let service = service(repository.clone());

        repository.fail_writes.store(true, Ordering::SeqCst);
        let result = service
            .update_record(
                LedgerFamily::Capital,
                &payable(),
                LedgerRecordUpdate {
                    id: usd.id.clone(),
                    amount: Some(dec!(999)),
                    ..Default::default()
                },
            )
            .await;
        assert!(matches!(result, Err(Error::Database(_))));

        repository.fail_writes.store(false, Ordering::SeqCst);
        let view = service.open_view(LedgerFamily::Capital, &payable()).unwrap();
        assert_eq!(view.records[0].amount, dec!(100));
    }

    // ==================== Aggregator ====================

    #[tokio::test]
    async fn test_aggregate_count_is_sum_of_partitions() {
        let repository = Arc::new(FlakyRepository::default());
        seed(
            &repository,
            &kenya(),
            &[
                record_in(&kenya(), "KC-1", dec!(1), "LKR"),
                record_in(&kenya(), "KC-2", dec!(2), "USD"),
            ],
        )
        .await;
        seed(&repository, &madagascar(), &[record_in(&madagascar(), "MC-1", dec!(3), "LKR")]).await;
        seed(&repository, &payable(), &[record_in(&payable(), "PC-1", dec!(4), "LKR")]).await;

        let aggregator = Aggregator::new(PartitionStore::new(repository));
        let merged = aggregator
            .aggregate(
                LedgerFamily::Capital,
                &payable(),
                &[kenya(), madagascar(), PartitionKey::new("tanzania", "Capital")],
            )
            .unwrap();

        assert_eq!(merged.len(), 4);
        let codes: Vec<&str> = merged.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["KC-1", "KC-2", "MC-1", "PC-1"]);
        assert_eq!(merged[3].origin(), payable());
    }

    #[tokio::test]
    async fn test_aggregate_drops_duplicate_ids() {
        let repository = Arc::new(FlakyRepository::default());
        let original = record_in(&kenya(), "KC-1", dec!(1), "LKR");
        let mut copy = original.clone();
        copy.set_origin(&madagascar());
        copy.code = "MC-COPY".to_string();
        seed(&repository, &kenya(), &[original.clone()]).await;
        seed(&repository, &madagascar(), &[copy]).await;

        let merged = Aggregator::new(PartitionStore::new(repository))
            .aggregate(LedgerFamily::Capital, &payable(), &[kenya(), madagascar()])
            .unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].code, "KC-1");
        assert_eq!(merged[0].origin(), kenya());
    }

    #[tokio::test]
    async fn test_aggregate_reads_self_listed_source_once() {
        let repository = Arc::new(FlakyRepository::default());
        seed(&repository, &payable(), &[record_in(&payable(), "PC-1", dec!(1), "LKR")]).await;

        let merged = Aggregator::new(PartitionStore::new(repository))
            .aggregate(LedgerFamily::Capital, &payable(), &[payable()])
            .unwrap();
        assert_eq!(merged.len(), 1);
    }

    // ==================== Router ====================

    fn router(repository: &Arc<FlakyRepository>) -> WriteBackRouter {
        let store = PartitionStore::new(repository.clone());
        WriteBackRouter::new(store.clone(), Aggregator::new(store))
    }

    fn mother_view() -> ViewContext {
        ViewContext::aggregate(LedgerFamily::Capital, payable(), vec![kenya(), madagascar()])
    }

    #[tokio::test]
    async fn test_routing_unmodified_record_twice_is_idempotent() {
        let repository = Arc::new(FlakyRepository::default());
        let record = record_in(&kenya(), "KC-1", dec!(10), "USD");
        seed(&repository, &kenya(), &[record.clone()]).await;
        let router = router(&repository);

        router.route(&mother_view(), record.clone(), false).await.unwrap();
        let after_first = repository
            .get_payload(&storage_key(LedgerFamily::Capital, &kenya()))
            .unwrap();
        router.route(&mother_view(), record, false).await.unwrap();
        let after_second = repository
            .get_payload(&storage_key(LedgerFamily::Capital, &kenya()))
            .unwrap();

        assert_eq!(after_first, after_second);
    }

    #[tokio::test]
    async fn test_router_rejects_origin_outside_view() {
        let repository = Arc::new(FlakyRepository::default());
        let stray = record_in(&PartitionKey::new("bangkok", "Capital"), "BC-1", dec!(1), "LKR");
        let native = ViewContext::native(LedgerFamily::Capital, kenya());

        let err = router(&repository)
            .route(&native, stray, false)
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(repository.writes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_new_record_ignores_foreign_origin_tag() {
        let repository = Arc::new(FlakyRepository::default());
        let record = record_in(&kenya(), "PC-1", dec!(1), "LKR");

        let displayed = router(&repository)
            .route(&mother_view(), record, true)
            .await
            .unwrap();
        assert_eq!(displayed[0].origin(), payable());
        assert_eq!(stored(&repository, &payable()).len(), 1);
        assert!(stored(&repository, &kenya()).is_empty());
    }

    // ==================== Session ====================

    #[tokio::test]
    async fn test_save_before_load_is_suppressed() {
        let repository = Arc::new(FlakyRepository::default());
        let persisted = record_in(&kenya(), "KC-1", dec!(1), "LKR");
        seed(&repository, &kenya(), &[persisted.clone()]).await;
        let writes_before = repository.writes.load(Ordering::SeqCst);

        let mut session = PartitionSession::new(
            PartitionStore::new(repository.clone()),
            LedgerFamily::Capital,
            kenya(),
        );
        assert_eq!(session.state(), SessionState::Unloaded);
        assert_eq!(session.save().await.unwrap(), SaveOutcome::Suppressed);

        // Edits made to the still-empty working copy must not be persisted either.
        session.apply(|records, _| Ok(records)).unwrap();
        assert_eq!(session.save().await.unwrap(), SaveOutcome::Suppressed);

        assert_eq!(repository.writes.load(Ordering::SeqCst), writes_before);
        assert_eq!(stored(&repository, &kenya()), vec![persisted]);
    }

    #[tokio::test]
    async fn test_session_state_transitions() {
        let repository = Arc::new(FlakyRepository::default());
        let mut session = PartitionSession::new(
            PartitionStore::new(repository.clone()),
            LedgerFamily::Capital,
            kenya(),
        );

        session.load().unwrap();
        assert_eq!(session.state(), SessionState::Clean);
        assert_eq!(session.save().await.unwrap(), SaveOutcome::Unchanged);

        let record = record_in(&kenya(), "KC-1", dec!(1), "LKR");
        session
            .apply(|records, key| crate::records::insert_record(records, record, key))
            .unwrap();
        assert_eq!(session.state(), SessionState::Dirty);

        repository.fail_writes.store(true, Ordering::SeqCst);
        assert!(session.save().await.is_err());
        assert_eq!(session.state(), SessionState::Dirty);

        repository.fail_writes.store(false, Ordering::SeqCst);
        assert_eq!(session.save().await.unwrap(), SaveOutcome::Saved);
        assert_eq!(session.state(), SessionState::Clean);

        session.unload();
        assert_eq!(session.state(), SessionState::Unloaded);
        assert!(session.records().is_empty());
        assert_eq!(stored(&repository, &kenya()).len(), 1);
    }
}

use async_trait::async_trait;
use log::{debug, warn};
use std::sync::Arc;

use super::aggregator::Aggregator;
use super::ledger_model::{LedgerView, ViewContext};
use super::router::WriteBackRouter;
use crate::errors::{LedgerError, Result};
use crate::partitions::{LedgerFamily, PartitionInfo, PartitionKey, PartitionRepositoryTrait};
use crate::records::{
    find_record, LedgerRecord, LedgerRecordUpdate, NewLedgerRecord, PartitionStore,
};
use crate::settings::SettingsServiceTrait;
use crate::tabs::TabResolver;

/// Operations a ledger screen performs. Every mutation returns the view as
/// re-read from storage.
#[async_trait]
pub trait LedgerServiceTrait: Send + Sync {
    /// Mounts the view for a tab: the union of its sources for a mother tab,
    /// its own records otherwise.
    fn open_view(&self, family: LedgerFamily, partition: &PartitionKey) -> Result<LedgerView>;

    /// Creates a record in the partition the view is mounted on.
    async fn create_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        new_record: NewLedgerRecord,
    ) -> Result<LedgerView>;

    /// Edits a record shown in the view, writing to the partition that owns it.
    async fn update_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        update: LedgerRecordUpdate,
    ) -> Result<LedgerView>;

    /// Deletes a record shown in the view from the partition that owns it.
    async fn delete_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        record_id: &str,
    ) -> Result<LedgerView>;

    fn list_partitions(&self, family: LedgerFamily) -> Result<Vec<PartitionInfo>>;
}

pub struct LedgerService {
    repository: Arc<dyn PartitionRepositoryTrait>,
    store: PartitionStore,
    aggregator: Aggregator,
    router: WriteBackRouter,
    resolver: TabResolver,
    settings_service: Arc<dyn SettingsServiceTrait>,
}

impl LedgerService {
    pub fn new(
        repository: Arc<dyn PartitionRepositoryTrait>,
        resolver: TabResolver,
        settings_service: Arc<dyn SettingsServiceTrait>,
    ) -> Self {
        let store = PartitionStore::new(repository.clone());
        let aggregator = Aggregator::new(store.clone());
        let router = WriteBackRouter::new(store.clone(), aggregator.clone());
        Self {
            repository,
            store,
            aggregator,
            router,
            resolver,
            settings_service,
        }
    }

    fn view_context(&self, family: LedgerFamily, partition: &PartitionKey) -> Result<ViewContext> {
        self.resolver.view_context(family, partition)
    }

    /// Fails if `id` is already taken in any partition of the family, whether
    /// or not the view can see it.
    fn ensure_unique_id(&self, context: &ViewContext, id: &str) -> Result<()> {
        let duplicate = |partition: &PartitionKey| LedgerError::DuplicateRecord {
            id: id.to_string(),
            partition: partition.to_string(),
        };

        let visible = self.aggregator.records_for(context)?;
        if let Some(existing) = find_record(&visible, id) {
            return Err(duplicate(&existing.origin()).into());
        }

        for info in self.repository.list_partitions(context.family)? {
            let records = self.store.load(context.family, &info.partition)?;
            if find_record(&records, id).is_some() {
                return Err(duplicate(&info.partition).into());
            }
        }
        Ok(())
    }

    fn to_view(&self, context: ViewContext, records: Vec<LedgerRecord>) -> Result<LedgerView> {
        let base_currency = self.settings_service.get_base_currency()?;
        Ok(LedgerView::new(context, &base_currency, records))
    }
}

#[async_trait]
impl LedgerServiceTrait for LedgerService {
    fn open_view(&self, family: LedgerFamily, partition: &PartitionKey) -> Result<LedgerView> {
        let context = self.view_context(family, partition)?;
        let records = self.aggregator.records_for(&context)?;
        debug!(
            "Opened {} view {} with {} record(s)",
            family,
            context.partition,
            records.len()
        );
        self.to_view(context, records)
    }

    async fn create_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        new_record: NewLedgerRecord,
    ) -> Result<LedgerView> {
        new_record.details.ensure_family(family)?;
        let context = self.view_context(family, partition)?;
        let settings = self.settings_service.get_settings()?;
        let record = new_record.into_record(
            &context.partition,
            &settings.base_currency,
            &settings.exchange_rates,
        )?;

        // Ids are unique across the whole family, not just this view.
        self.ensure_unique_id(&context, &record.id)?;

        let records = self.router.route(&context, record, true).await?;
        self.to_view(context, records)
    }

    async fn update_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        update: LedgerRecordUpdate,
    ) -> Result<LedgerView> {
        update.validate()?;
        let context = self.view_context(family, partition)?;
        let visible = self.aggregator.records_for(&context)?;
        let existing = find_record(&visible, &update.id).ok_or_else(|| {
            LedgerError::RecordNotFound {
                id: update.id.clone(),
                partition: context.partition.to_string(),
            }
        })?;

        if let Some(hint) = update.origin_hint() {
            if !hint.matches(&existing.origin()) {
                warn!(
                    "Record {} claims origin {} but is stored in {}; using the stored origin",
                    update.id,
                    hint,
                    existing.origin()
                );
            }
        }

        let settings = self.settings_service.get_settings()?;
        let edited =
            existing.apply_update(&update, &settings.base_currency, &settings.exchange_rates)?;
        let records = self.router.route(&context, edited, false).await?;
        self.to_view(context, records)
    }

    async fn delete_record(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        record_id: &str,
    ) -> Result<LedgerView> {
        let context = self.view_context(family, partition)?;
        let visible = self.aggregator.records_for(&context)?;
        let existing = find_record(&visible, record_id).ok_or_else(|| {
            LedgerError::RecordNotFound {
                id: record_id.to_string(),
                partition: context.partition.to_string(),
            }
        })?;

        let records = self.router.route_delete(&context, existing).await?;
        self.to_view(context, records)
    }

    fn list_partitions(&self, family: LedgerFamily) -> Result<Vec<PartitionInfo>> {
        self.repository.list_partitions(family)
    }
}

//! Write-back routing for edits made from a ledger view.

use log::{debug, info};

use super::aggregator::Aggregator;
use super::ledger_model::ViewContext;
use super::ledger_session::{PartitionSession, SaveOutcome};
use crate::errors::{LedgerError, Result};
use crate::partitions::PartitionKey;
use crate::records::{self, LedgerRecord, PartitionStore};

/// Sends each mutation to the partition that owns the record, then re-reads
/// the view so callers display persisted state rather than a local patch.
#[derive(Clone)]
pub struct WriteBackRouter {
    store: PartitionStore,
    aggregator: Aggregator,
}

impl WriteBackRouter {
    pub fn new(store: PartitionStore, aggregator: Aggregator) -> Self {
        Self { store, aggregator }
    }

    /// Picks the partition a write must land in.
    ///
    /// New records belong to the partition the view is mounted on. Existing
    /// records go back to their origin, which must be the view's own
    /// partition or one of its sources.
    pub fn target_for(
        &self,
        view: &ViewContext,
        record: &LedgerRecord,
        is_new: bool,
    ) -> Result<PartitionKey> {
        if is_new {
            return Ok(view.partition.clone());
        }
        let origin = record.origin();
        if origin.module_id.is_empty() && origin.tab_id.is_empty() {
            return Ok(view.partition.clone());
        }
        view.member(&origin).cloned().ok_or_else(|| {
            LedgerError::InvalidPartition(format!(
                "record {} belongs to {}, which is not shown in {}",
                record.id, origin, view.partition
            ))
            .into()
        })
    }

    /// Inserts (`is_new`) or replaces `record` in its owning partition and
    /// returns the refreshed view. Nothing is returned for display if the
    /// save fails, so the caller keeps its previous list.
    pub async fn route(
        &self,
        view: &ViewContext,
        mut record: LedgerRecord,
        is_new: bool,
    ) -> Result<Vec<LedgerRecord>> {
        let target = self.target_for(view, &record, is_new)?;
        record.set_origin(&target);

        let mut session = PartitionSession::new(self.store.clone(), view.family, target.clone());
        session.load()?;
        if is_new {
            session.apply(|records, key| records::insert_record(records, record, key))?;
        } else {
            session.apply(|records, key| records::update_record(records, record, key))?;
        }
        let outcome = session.save().await?;
        debug!(
            "Routed {} write to {} ({:?})",
            if is_new { "insert" } else { "update" },
            session.storage_key(),
            outcome
        );

        self.refresh(view, session)
    }

    /// Deletes `record` from the partition named by its origin tag.
    pub async fn route_delete(
        &self,
        view: &ViewContext,
        record: &LedgerRecord,
    ) -> Result<Vec<LedgerRecord>> {
        let target = self.target_for(view, record, false)?;
        let record_id = record.id.clone();

        let mut session = PartitionSession::new(self.store.clone(), view.family, target.clone());
        session.load()?;
        session.apply(|records, key| {
            records::delete_record(records, &record_id, key).map(|(remaining, _)| remaining)
        })?;
        let outcome = session.save().await?;
        if outcome == SaveOutcome::Saved {
            info!("Deleted record {} from {}", record_id, session.storage_key());
        }

        self.refresh(view, session)
    }

    fn refresh(&self, view: &ViewContext, session: PartitionSession) -> Result<Vec<LedgerRecord>> {
        // A native view can only route to itself, so the session already
        // holds exactly what was persisted.
        if view.is_aggregate {
            self.aggregator.records_for(view)
        } else {
            Ok(session.into_records())
        }
    }
}

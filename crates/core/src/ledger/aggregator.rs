//! Builds the merged record list shown by a mother tab.

use log::{debug, warn};
use std::collections::HashMap;

use super::ledger_model::ViewContext;
use crate::errors::Result;
use crate::partitions::{LedgerFamily, PartitionKey};
use crate::records::{LedgerRecord, PartitionStore};

#[derive(Clone)]
pub struct Aggregator {
    store: PartitionStore,
}

impl Aggregator {
    pub fn new(store: PartitionStore) -> Self {
        Self { store }
    }

    /// Unions the records of every source partition and of `current`.
    ///
    /// Records keep topology order: sources as listed, then the current
    /// partition's own records. Each record is stamped with the partition it
    /// was read from. A source that names `current` is read only once. If the
    /// same id shows up in two partitions the first occurrence wins and the
    /// collision is logged.
    pub fn aggregate(
        &self,
        family: LedgerFamily,
        current: &PartitionKey,
        sources: &[PartitionKey],
    ) -> Result<Vec<LedgerRecord>> {
        let mut merged: Vec<LedgerRecord> = Vec::new();
        let mut seen: HashMap<String, PartitionKey> = HashMap::new();

        let partitions = sources
            .iter()
            .filter(|source| !source.matches(current))
            .chain(std::iter::once(current));

        for partition in partitions {
            let records = self.store.load(family, partition)?;
            debug!(
                "Aggregating {} record(s) from {}/{} into {}",
                records.len(),
                family,
                partition,
                current
            );
            for record in records {
                if let Some(first) = seen.get(&record.id) {
                    warn!(
                        "Record id {} appears in both {} and {}; keeping the copy from {}",
                        record.id, first, partition, first
                    );
                    continue;
                }
                seen.insert(record.id.clone(), partition.clone());
                merged.push(record);
            }
        }

        Ok(merged)
    }

    /// Reads whatever a view displays: the union for a mother tab, the
    /// partition itself otherwise.
    pub fn records_for(&self, view: &ViewContext) -> Result<Vec<LedgerRecord>> {
        if view.is_aggregate {
            self.aggregate(view.family, &view.partition, &view.sources)
        } else {
            self.store.load(view.family, &view.partition)
        }
    }
}

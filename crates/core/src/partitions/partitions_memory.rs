//! In-process partition repository, used for tests and ephemeral ledgers.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::RwLock;

use super::partitions_model::{LedgerFamily, PartitionInfo, PartitionKey};
use super::partitions_traits::PartitionRepositoryTrait;
use crate::errors::{Error, Result};

struct StoredPartition {
    family: LedgerFamily,
    partition: PartitionKey,
    payload: String,
    updated_at: NaiveDateTime,
}

#[derive(Default)]
pub struct InMemoryPartitionRepository {
    partitions: RwLock<BTreeMap<String, StoredPartition>>,
}

impl InMemoryPartitionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of persisted partitions across all families.
    pub fn len(&self) -> usize {
        self.partitions.read().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(err: std::sync::PoisonError<T>) -> Error {
    Error::Repository(format!("partition map lock poisoned: {}", err))
}

#[async_trait]
impl PartitionRepositoryTrait for InMemoryPartitionRepository {
    fn get_payload(&self, storage_key: &str) -> Result<Option<String>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions.get(storage_key).map(|p| p.payload.clone()))
    }

    async fn put_payload(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        storage_key: &str,
        payload: String,
    ) -> Result<()> {
        let mut partitions = self.partitions.write().map_err(poisoned)?;
        partitions.insert(
            storage_key.to_string(),
            StoredPartition {
                family,
                partition: partition.clone(),
                payload,
                updated_at: Utc::now().naive_utc(),
            },
        );
        Ok(())
    }

    fn list_partitions(&self, family: LedgerFamily) -> Result<Vec<PartitionInfo>> {
        let partitions = self.partitions.read().map_err(poisoned)?;
        Ok(partitions
            .iter()
            .filter(|(_, stored)| stored.family == family)
            .map(|(key, stored)| PartitionInfo {
                family: stored.family,
                partition: stored.partition.clone(),
                storage_key: key.clone(),
                updated_at: stored.updated_at,
            })
            .collect())
    }
}

//! Load/save of whole partitions on top of a [`PartitionRepositoryTrait`].

use log::{debug, warn};
use std::sync::Arc;

use super::records_model::LedgerRecord;
use crate::errors::{DatabaseError, Error, Result};
use crate::partitions::{storage_key, LedgerFamily, PartitionKey, PartitionRepositoryTrait};

/// Reads and writes complete record arrays, one partition at a time.
#[derive(Clone)]
pub struct PartitionStore {
    repository: Arc<dyn PartitionRepositoryTrait>,
}

impl PartitionStore {
    pub fn new(repository: Arc<dyn PartitionRepositoryTrait>) -> Self {
        Self { repository }
    }

    /// Loads a partition.
    ///
    /// A partition that was never written is empty. A payload that cannot be
    /// decoded is logged and also treated as empty; storage failures are
    /// still returned as errors. Every record comes back stamped with the
    /// partition it was read from.
    pub fn load(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
    ) -> Result<Vec<LedgerRecord>> {
        partition.validate()?;
        let key = storage_key(family, partition);

        let Some(payload) = self.repository.get_payload(&key)? else {
            debug!("Partition {} has no persisted records", key);
            return Ok(Vec::new());
        };

        let mut records: Vec<LedgerRecord> = match serde_json::from_str(&payload) {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    "Partition {} holds malformed data ({}); treating it as empty",
                    key, e
                );
                return Ok(Vec::new());
            }
        };

        let total = records.len();
        records.retain(|record| record.family() == family);
        if records.len() != total {
            warn!(
                "Partition {} held {} record(s) of another ledger family; ignoring them",
                key,
                total - records.len()
            );
        }

        for record in &mut records {
            record.set_origin(partition);
        }
        Ok(records)
    }

    /// Overwrites a partition with `records`.
    pub async fn save(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        records: &[LedgerRecord],
    ) -> Result<()> {
        partition.validate()?;
        let key = storage_key(family, partition);
        let payload =
            serde_json::to_string(records).map_err(|e| encode_error(&key, e))?;
        debug!("Saving {} record(s) to partition {}", records.len(), key);
        self.repository
            .put_payload(family, partition, &key, payload)
            .await
    }
}

/// A partition that cannot be encoded is a server-side fault, never bad input.
pub(crate) fn encode_error(storage_key: &str, err: serde_json::Error) -> Error {
    Error::Database(DatabaseError::Internal(format!(
        "Failed to encode partition {}: {}",
        storage_key, err
    )))
}

//! Partition repository trait.
//!
//! The repository persists one opaque payload per storage key. Encoding and
//! decoding of the record array lives in the core so that every backend
//! shares the same tolerance for malformed data.

use async_trait::async_trait;

use super::partitions_model::{LedgerFamily, PartitionInfo, PartitionKey};
use crate::errors::Result;

/// Trait defining the contract for partition persistence.
#[async_trait]
pub trait PartitionRepositoryTrait: Send + Sync {
    /// Returns the serialized record array stored under `storage_key`,
    /// or `None` if the partition has never been written.
    fn get_payload(&self, storage_key: &str) -> Result<Option<String>>;

    /// Replaces the partition's payload. No merge: the last write wins.
    async fn put_payload(
        &self,
        family: LedgerFamily,
        partition: &PartitionKey,
        storage_key: &str,
        payload: String,
    ) -> Result<()>;

    /// Lists the partitions persisted for a family.
    fn list_partitions(&self, family: LedgerFamily) -> Result<Vec<PartitionInfo>>;
}

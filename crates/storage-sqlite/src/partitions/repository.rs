use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use log::debug;
use std::sync::Arc;

use super::model::LedgerPartitionDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::ledger_partitions;
use crate::schema::ledger_partitions::dsl::*;
use gemledger_core::errors::Result;
use gemledger_core::partitions::{
    LedgerFamily, PartitionInfo, PartitionKey, PartitionRepositoryTrait,
};

/// Stores each partition as one row keyed by its storage key.
pub struct PartitionRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl PartitionRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        PartitionRepository { pool, writer }
    }
}

#[async_trait]
impl PartitionRepositoryTrait for PartitionRepository {
    fn get_payload(&self, key: &str) -> Result<Option<String>> {
        let mut conn = get_connection(&self.pool)?;
        let stored = ledger_partitions
            .find(key)
            .select(payload)
            .first::<String>(&mut conn)
            .optional()
            .map_err(StorageError::from)?;
        Ok(stored)
    }

    async fn put_payload(
        &self,
        ledger_family: LedgerFamily,
        partition: &PartitionKey,
        key: &str,
        new_payload: String,
    ) -> Result<()> {
        let row = LedgerPartitionDB::new(
            ledger_family,
            partition,
            key,
            new_payload,
            Utc::now().naive_utc(),
        );

        self.writer
            .exec(move |conn| {
                diesel::replace_into(ledger_partitions::table)
                    .values(&row)
                    .execute(conn)
                    .map_err(StorageError::from)?;
                debug!("Persisted partition {}", row.partition_key);
                Ok(())
            })
            .await
    }

    fn list_partitions(&self, ledger_family: LedgerFamily) -> Result<Vec<PartitionInfo>> {
        let mut conn = get_connection(&self.pool)?;
        let rows = ledger_partitions
            .filter(family.eq(ledger_family.as_str()))
            .order(partition_key.asc())
            .select(LedgerPartitionDB::as_select())
            .load::<LedgerPartitionDB>(&mut conn)
            .map_err(StorageError::from)?;
        rows.into_iter().map(PartitionInfo::try_from).collect()
    }
}

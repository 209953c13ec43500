//! Database model for ledger partitions.

use chrono::NaiveDateTime;
use diesel::prelude::*;
use gemledger_core::errors::Result;
use gemledger_core::partitions::{LedgerFamily, PartitionInfo, PartitionKey};

/// One partition row: the whole record array of a (family, module, tab)
/// serialized as JSON.
#[derive(Queryable, Selectable, Insertable, Debug, Clone)]
#[diesel(table_name = crate::schema::ledger_partitions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct LedgerPartitionDB {
    pub partition_key: String,
    pub family: String,
    pub module_id: String,
    pub tab_id: String,
    pub payload: String,
    pub updated_at: NaiveDateTime,
}

impl LedgerPartitionDB {
    pub fn new(
        family: LedgerFamily,
        partition: &PartitionKey,
        storage_key: &str,
        payload: String,
        updated_at: NaiveDateTime,
    ) -> Self {
        Self {
            partition_key: storage_key.to_string(),
            family: family.as_str().to_string(),
            module_id: partition.module_id.clone(),
            tab_id: partition.tab_id.clone(),
            payload,
            updated_at,
        }
    }
}

impl TryFrom<LedgerPartitionDB> for PartitionInfo {
    type Error = gemledger_core::Error;

    fn try_from(db: LedgerPartitionDB) -> Result<Self> {
        Ok(PartitionInfo {
            family: db.family.parse()?,
            partition: PartitionKey::new(db.module_id, db.tab_id),
            storage_key: db.partition_key,
            updated_at: db.updated_at,
        })
    }
}

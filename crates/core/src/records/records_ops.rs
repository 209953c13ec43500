//! Pure in-memory edits over a partition's record array.
//!
//! None of these functions persist anything; callers save the returned vector.

use super::records_model::LedgerRecord;
use crate::errors::{LedgerError, Result};

/// Appends `record`, refusing an id that is already present.
pub fn insert_record(
    mut records: Vec<LedgerRecord>,
    record: LedgerRecord,
    partition: &str,
) -> Result<Vec<LedgerRecord>> {
    if records.iter().any(|existing| existing.id == record.id) {
        return Err(LedgerError::DuplicateRecord {
            id: record.id,
            partition: partition.to_string(),
        }
        .into());
    }
    records.push(record);
    Ok(records)
}

/// Replaces the record with the same id, keeping its position.
pub fn update_record(
    mut records: Vec<LedgerRecord>,
    record: LedgerRecord,
    partition: &str,
) -> Result<Vec<LedgerRecord>> {
    match records.iter_mut().find(|existing| existing.id == record.id) {
        Some(slot) => {
            *slot = record;
            Ok(records)
        }
        None => Err(LedgerError::RecordNotFound {
            id: record.id,
            partition: partition.to_string(),
        }
        .into()),
    }
}

/// Removes the record with `id`, returning the remaining records and the removed one.
pub fn delete_record(
    mut records: Vec<LedgerRecord>,
    id: &str,
    partition: &str,
) -> Result<(Vec<LedgerRecord>, LedgerRecord)> {
    match records.iter().position(|existing| existing.id == id) {
        Some(index) => {
            let removed = records.remove(index);
            Ok((records, removed))
        }
        None => Err(LedgerError::RecordNotFound {
            id: id.to_string(),
            partition: partition.to_string(),
        }
        .into()),
    }
}

pub fn find_record<'a>(records: &'a [LedgerRecord], id: &str) -> Option<&'a LedgerRecord> {
    records.iter().find(|record| record.id == id)
}

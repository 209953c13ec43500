//! Per-partition load/save state machine.

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::partitions::{storage_key, LedgerFamily, PartitionKey};
use crate::records::{LedgerRecord, PartitionStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// Nothing read yet; saving is not allowed.
    Unloaded,
    /// In-memory records match what is persisted.
    Clean,
    /// In-memory records have changes that are not persisted yet.
    Dirty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved,
    /// Nothing changed since the last load or save.
    Unchanged,
    /// Refused because the partition was never loaded; persisting would
    /// overwrite stored records with an empty or partial array.
    Suppressed,
}

/// In-memory working copy of one partition.
///
/// `Unloaded -> Clean <-> Dirty -> Unloaded`. A save requested before the
/// first load completes is suppressed, never written.
pub struct PartitionSession {
    store: PartitionStore,
    family: LedgerFamily,
    partition: PartitionKey,
    state: SessionState,
    records: Vec<LedgerRecord>,
}

impl PartitionSession {
    pub fn new(store: PartitionStore, family: LedgerFamily, partition: PartitionKey) -> Self {
        Self {
            store,
            family,
            partition,
            state: SessionState::Unloaded,
            records: Vec::new(),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn storage_key(&self) -> String {
        storage_key(self.family, &self.partition)
    }

    pub fn records(&self) -> &[LedgerRecord] {
        &self.records
    }

    /// Reads the partition, discarding any unsaved in-memory edits.
    pub fn load(&mut self) -> Result<&[LedgerRecord]> {
        self.records = self.store.load(self.family, &self.partition)?;
        self.state = SessionState::Clean;
        debug!(
            "Loaded {} record(s) from {}",
            self.records.len(),
            self.storage_key()
        );
        Ok(&self.records)
    }

    /// Applies a pure edit to the working copy. On error the copy is untouched.
    pub fn apply<F>(&mut self, edit: F) -> Result<()>
    where
        F: FnOnce(Vec<LedgerRecord>, &str) -> Result<Vec<LedgerRecord>>,
    {
        let key = self.storage_key();
        let next = edit(self.records.clone(), &key)?;
        self.records = next;
        if self.state == SessionState::Clean {
            self.state = SessionState::Dirty;
        }
        Ok(())
    }

    /// Persists the working copy if it is loaded and has changes.
    ///
    /// A failed save leaves the session dirty so the caller can retry.
    pub async fn save(&mut self) -> Result<SaveOutcome> {
        match self.state {
            SessionState::Unloaded => {
                warn!(
                    "Suppressed save of {}: partition has not been loaded",
                    self.storage_key()
                );
                Ok(SaveOutcome::Suppressed)
            }
            SessionState::Clean => Ok(SaveOutcome::Unchanged),
            SessionState::Dirty => {
                self.store
                    .save(self.family, &self.partition, &self.records)
                    .await?;
                self.state = SessionState::Clean;
                Ok(SaveOutcome::Saved)
            }
        }
    }

    /// Tears the view down; the next use must load again.
    pub fn unload(&mut self) {
        if self.state == SessionState::Dirty {
            warn!(
                "Unloading {} with unsaved changes; they are discarded",
                self.storage_key()
            );
        }
        self.records.clear();
        self.state = SessionState::Unloaded;
    }

    pub fn into_records(self) -> Vec<LedgerRecord> {
        self.records
    }
}

//! Repository traits for settings.

use async_trait::async_trait;

use crate::errors::Result;
use crate::settings::{LedgerSettings, LedgerSettingsUpdate};

/// Repository trait for managing ledger settings.
#[async_trait]
pub trait SettingsRepositoryTrait: Send + Sync {
    /// Get all settings, falling back to defaults for anything never stored.
    fn get_settings(&self) -> Result<LedgerSettings>;

    /// Persist the fields present in `update`.
    async fn update_settings(&self, update: &LedgerSettingsUpdate) -> Result<()>;
}

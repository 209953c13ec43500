//! SQLite storage implementation for ledger settings.

mod model;
mod repository;

pub use model::AppSettingDB;
pub use repository::SettingsRepository;

// Re-export trait from core for convenience
pub use gemledger_core::settings::SettingsRepositoryTrait;

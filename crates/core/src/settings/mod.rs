//! Settings module - base currency and exchange-rate table.

mod settings_model;
mod settings_service;
mod settings_traits;

pub use settings_model::{LedgerSettings, LedgerSettingsUpdate};
pub use settings_service::{SettingsService, SettingsServiceTrait};
pub use settings_traits::SettingsRepositoryTrait;

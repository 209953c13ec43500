use async_trait::async_trait;
use log::{debug, info};
use rust_decimal::Decimal;
use std::sync::Arc;

use super::SettingsRepositoryTrait;
use crate::errors::{Result, ValidationError};
use crate::fx::RateTable;
use crate::partitions::{LedgerFamily, PartitionRepositoryTrait};
use crate::settings::{LedgerSettings, LedgerSettingsUpdate};

#[async_trait]
pub trait SettingsServiceTrait: Send + Sync {
    fn get_settings(&self) -> Result<LedgerSettings>;

    fn get_base_currency(&self) -> Result<String>;

    fn get_rate_table(&self) -> Result<RateTable>;

    async fn update_settings(&self, update: LedgerSettingsUpdate) -> Result<LedgerSettings>;

    /// Sets the rate for one currency, leaving the rest of the table alone.
    async fn set_exchange_rate(&self, currency: &str, rate: Decimal) -> Result<LedgerSettings>;
}

pub struct SettingsService {
    settings_repository: Arc<dyn SettingsRepositoryTrait>,
    partition_repository: Arc<dyn PartitionRepositoryTrait>,
}

impl SettingsService {
    pub fn new(
        settings_repository: Arc<dyn SettingsRepositoryTrait>,
        partition_repository: Arc<dyn PartitionRepositoryTrait>,
    ) -> Self {
        Self {
            settings_repository,
            partition_repository,
        }
    }

    fn has_persisted_partitions(&self) -> Result<bool> {
        for family in LedgerFamily::ALL {
            if !self.partition_repository.list_partitions(family)?.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[async_trait]
impl SettingsServiceTrait for SettingsService {
    fn get_settings(&self) -> Result<LedgerSettings> {
        self.settings_repository.get_settings()
    }

    fn get_base_currency(&self) -> Result<String> {
        Ok(self.get_settings()?.base_currency)
    }

    fn get_rate_table(&self) -> Result<RateTable> {
        Ok(self.get_settings()?.exchange_rates)
    }

    async fn update_settings(&self, mut update: LedgerSettingsUpdate) -> Result<LedgerSettings> {
        update.normalize()?;
        let current = self.get_settings()?;

        // Stored converted amounts are expressed in the current base currency.
        if let Some(base) = &update.base_currency {
            if *base != current.base_currency && self.has_persisted_partitions()? {
                return Err(ValidationError::InvalidInput(format!(
                    "base currency cannot change from {} to {} once ledgers hold records",
                    current.base_currency, base
                ))
                .into());
            }
        }

        let base = update
            .base_currency
            .clone()
            .unwrap_or_else(|| current.base_currency.clone());
        let rates = update
            .exchange_rates
            .as_ref()
            .unwrap_or(&current.exchange_rates);
        if rates.get(&base).is_some() {
            return Err(ValidationError::InvalidInput(format!(
                "the rate table cannot contain the base currency {}",
                base
            ))
            .into());
        }

        debug!("Updating ledger settings: {:?}", update);
        self.settings_repository.update_settings(&update).await?;
        if update.base_currency.is_some() {
            info!("Base currency set to {}", base);
        }
        self.get_settings()
    }

    async fn set_exchange_rate(&self, currency: &str, rate: Decimal) -> Result<LedgerSettings> {
        let mut rates = self.get_rate_table()?;
        rates.set_rate(currency, rate)?;
        self.update_settings(LedgerSettingsUpdate {
            base_currency: None,
            exchange_rates: Some(rates),
        })
        .await
    }
}

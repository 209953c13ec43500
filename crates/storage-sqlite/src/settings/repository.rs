use async_trait::async_trait;
use diesel::prelude::*;
use log::warn;
use std::sync::Arc;

use super::model::AppSettingDB;
use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::schema::app_settings::dsl::*;
use gemledger_core::constants::{BASE_CURRENCY_SETTING, EXCHANGE_RATES_SETTING};
use gemledger_core::errors::Result;
use gemledger_core::fx::RateTable;
use gemledger_core::settings::{LedgerSettings, LedgerSettingsUpdate, SettingsRepositoryTrait};

pub struct SettingsRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl SettingsRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        SettingsRepository { pool, writer }
    }
}

/// Parses the stored rate table, falling back to an empty one if the row
/// was edited into something unreadable.
fn parse_rate_table(value: &str) -> RateTable {
    match serde_json::from_str::<RateTable>(value) {
        Ok(rates) => match rates.validate() {
            Ok(()) => rates,
            Err(e) => {
                warn!("Ignoring stored exchange rates: {}", e);
                RateTable::default()
            }
        },
        Err(e) => {
            warn!("Ignoring malformed exchange rates setting: {}", e);
            RateTable::default()
        }
    }
}

#[async_trait]
impl SettingsRepositoryTrait for SettingsRepository {
    fn get_settings(&self) -> Result<LedgerSettings> {
        let mut conn = get_connection(&self.pool)?;
        let all_settings: Vec<(String, String)> = app_settings
            .select((setting_key, setting_value))
            .load::<(String, String)>(&mut conn)
            .map_err(StorageError::from)?;

        let mut settings = LedgerSettings::default();

        for (key, value) in all_settings {
            match key.as_str() {
                BASE_CURRENCY_SETTING => settings.base_currency = value,
                EXCHANGE_RATES_SETTING => settings.exchange_rates = parse_rate_table(&value),
                _ => {} // Ignore unknown settings
            }
        }

        Ok(settings)
    }

    async fn update_settings(&self, update: &LedgerSettingsUpdate) -> Result<()> {
        let mut rows: Vec<AppSettingDB> = Vec::new();
        if let Some(base) = &update.base_currency {
            rows.push(AppSettingDB {
                setting_key: BASE_CURRENCY_SETTING.to_string(),
                setting_value: base.clone(),
            });
        }
        if let Some(rates) = &update.exchange_rates {
            rows.push(AppSettingDB {
                setting_key: EXCHANGE_RATES_SETTING.to_string(),
                setting_value: serde_json::to_string(rates).map_err(StorageError::from)?,
            });
        }
        if rows.is_empty() {
            return Ok(());
        }

        self.writer
            .exec(move |conn| {
                for row in &rows {
                    diesel::replace_into(app_settings)
                        .values(row)
                        .execute(conn)
                        .map_err(StorageError::from)?;
                }
                Ok(())
            })
            .await
    }
}

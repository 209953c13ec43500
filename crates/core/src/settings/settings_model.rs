//! Ledger settings models.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_BASE_CURRENCY;
use crate::errors::ValidationError;
use crate::fx::RateTable;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettings {
    pub base_currency: String,
    pub exchange_rates: RateTable,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        Self {
            base_currency: DEFAULT_BASE_CURRENCY.to_string(),
            exchange_rates: RateTable::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSettingsUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rates: Option<RateTable>,
}

impl LedgerSettingsUpdate {
    /// Validates and normalizes the update in place.
    pub fn normalize(&mut self) -> Result<()> {
        if let Some(base) = &self.base_currency {
            let code = base.trim().to_ascii_uppercase();
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(ValidationError::InvalidInput(format!(
                    "'{}' is not a three-letter currency code",
                    base
                ))
                .into());
            }
            self.base_currency = Some(code);
        }
        if let Some(rates) = &self.exchange_rates {
            rates.validate()?;
        }
        Ok(())
    }
}

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fx_errors::FxError;

/// Exchange rates into the base currency, keyed by upper-case currency code.
///
/// A rate `r` for `USD` means one USD is worth `r` units of the base currency.
/// The table is injected wherever amounts are derived so callers (and tests)
/// control exactly which rates apply.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct RateTable {
    rates: BTreeMap<String, Decimal>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a table from `(currency, rate)` pairs, rejecting non-positive rates.
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, FxError>
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        let mut table = Self::new();
        for (currency, rate) in pairs {
            table.set_rate(currency.as_ref(), rate)?;
        }
        Ok(table)
    }

    /// Builder-style variant of [`RateTable::set_rate`].
    pub fn with_rate(mut self, currency: &str, rate: Decimal) -> Result<Self, FxError> {
        self.set_rate(currency, rate)?;
        Ok(self)
    }

    pub fn set_rate(&mut self, currency: &str, rate: Decimal) -> Result<(), FxError> {
        let code = normalize_code(currency)?;
        if rate <= Decimal::ZERO {
            return Err(FxError::InvalidRate(format!(
                "rate for {} must be positive, got {}",
                code, rate
            )));
        }
        self.rates.insert(code, rate);
        Ok(())
    }

    pub fn get(&self, currency: &str) -> Option<Decimal> {
        self.rates
            .get(&currency.trim().to_ascii_uppercase())
            .copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Re-checks every entry. Tables deserialized from storage bypass `set_rate`.
    pub fn validate(&self) -> Result<(), FxError> {
        for (code, rate) in &self.rates {
            normalize_code(code)?;
            if *rate <= Decimal::ZERO {
                return Err(FxError::InvalidRate(format!(
                    "rate for {} must be positive, got {}",
                    code, rate
                )));
            }
        }
        Ok(())
    }
}

fn normalize_code(currency: &str) -> Result<String, FxError> {
    let code = currency.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(FxError::InvalidCurrencyCode(currency.to_string()));
    }
    Ok(code)
}

//! Ledger record domain models.

use chrono::{NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{LedgerError, ValidationError};
use crate::fx::{derive_amount, RateTable};
use crate::partitions::{LedgerFamily, PartitionKey};
use crate::{Error, Result};

/// Descriptive fields of a capital movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CapitalDetails {
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// Descriptive fields of an expense.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseDetails {
    pub vendor: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paid_by: Option<String>,
}

/// Descriptive fields of an inventory sheet line (a stone or a parcel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SheetDetails {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Weight in carats.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pieces: Option<u32>,
}

/// Family-specific part of a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum RecordDetails {
    Capital(CapitalDetails),
    Expense(ExpenseDetails),
    Sheet(SheetDetails),
}

impl RecordDetails {
    pub fn family(&self) -> LedgerFamily {
        match self {
            RecordDetails::Capital(_) => LedgerFamily::Capital,
            RecordDetails::Expense(_) => LedgerFamily::Expense,
            RecordDetails::Sheet(_) => LedgerFamily::Sheet,
        }
    }

    /// Checks the field each form marks as required.
    pub fn validate(&self) -> Result<()> {
        match self {
            RecordDetails::Capital(details) if details.vendor.trim().is_empty() => {
                Err(ValidationError::MissingField("vendor".to_string()).into())
            }
            RecordDetails::Expense(details) if details.vendor.trim().is_empty() => {
                Err(ValidationError::MissingField("vendor".to_string()).into())
            }
            RecordDetails::Sheet(details) if details.title.trim().is_empty() => {
                Err(ValidationError::MissingField("title".to_string()).into())
            }
            RecordDetails::Sheet(SheetDetails {
                weight: Some(weight),
                ..
            }) if *weight < Decimal::ZERO => Err(ValidationError::InvalidInput(
                "weight cannot be negative".to_string(),
            )
            .into()),
            _ => Ok(()),
        }
    }

    /// Rejects details that belong to a different ledger family.
    pub fn ensure_family(&self, expected: LedgerFamily) -> Result<()> {
        let actual = self.family();
        if actual != expected {
            return Err(LedgerError::FamilyMismatch {
                expected: expected.to_string(),
                actual: actual.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// A persisted ledger row.
///
/// `source_module` / `source_tab` name the partition that owns the record.
/// They are set on every record, native ones included, and are what the
/// write-back router uses to find the partition to write to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub id: String,
    /// Older payloads were written without origin fields; the store stamps
    /// them with the partition they were read from.
    #[serde(default)]
    pub source_module: String,
    #[serde(default)]
    pub source_tab: String,
    pub date: NaiveDate,
    pub code: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converted_amount: Option<Decimal>,
    pub details: RecordDetails,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl LedgerRecord {
    pub fn origin(&self) -> PartitionKey {
        PartitionKey::new(&self.source_module, &self.source_tab)
    }

    pub fn set_origin(&mut self, partition: &PartitionKey) {
        self.source_module = partition.module_id.clone();
        self.source_tab = partition.tab_id.clone();
    }

    pub fn family(&self) -> LedgerFamily {
        self.details.family()
    }

    /// Recomputes `exchange_rate` / `converted_amount` from amount, currency
    /// and the record's own rate (falling back to `rates`).
    pub fn rederive(&mut self, base_currency: &str, rates: &RateTable) -> Result<()> {
        let derived = derive_amount(
            self.amount,
            &self.currency,
            self.exchange_rate,
            base_currency,
            rates,
        )?;
        self.exchange_rate = derived.exchange_rate;
        self.converted_amount = derived.converted_amount;
        Ok(())
    }

    /// Amount expressed in the base currency, if it can be known.
    pub fn base_amount(&self, base_currency: &str) -> Option<Decimal> {
        if crate::fx::is_base_currency(&self.currency, base_currency) {
            Some(self.amount)
        } else {
            self.converted_amount
        }
    }

    /// Applies a field patch and re-derives the converted amount.
    ///
    /// Changing the currency drops the previous rate unless the patch brings
    /// its own; a USD rate must never be reused for a EUR amount.
    pub fn apply_update(
        &self,
        update: &LedgerRecordUpdate,
        base_currency: &str,
        rates: &RateTable,
    ) -> Result<LedgerRecord> {
        update.validate()?;
        if let Some(details) = &update.details {
            details.ensure_family(self.family())?;
        }

        let mut next = self.clone();
        if let Some(date) = update.date {
            next.date = date;
        }
        if let Some(code) = &update.code {
            next.code = code.trim().to_string();
        }
        if let Some(amount) = update.amount {
            next.amount = amount;
        }
        if let Some(currency) = &update.currency {
            let currency = normalize_currency(currency);
            if currency != next.currency {
                next.exchange_rate = None;
            }
            next.currency = currency;
        }
        if let Some(rate) = update.exchange_rate {
            next.exchange_rate = Some(rate);
        }
        if let Some(details) = &update.details {
            next.details = details.clone();
        }
        next.updated_at = Utc::now().naive_utc();
        next.rederive(base_currency, rates)?;
        Ok(next)
    }
}

/// Input model for creating a record from a new-record form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLedgerRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub date: NaiveDate,
    pub code: String,
    pub amount: Decimal,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    pub details: RecordDetails,
}

impl NewLedgerRecord {
    /// Validates the form before anything is created.
    pub fn validate(&self) -> Result<()> {
        if self.code.trim().is_empty() {
            return Err(ValidationError::MissingField("code".to_string()).into());
        }
        validate_amount(self.amount)?;
        validate_currency(&self.currency)?;
        validate_rate(self.exchange_rate)?;
        self.details.validate()
    }

    /// Materializes the record inside `partition`, generating an id when the
    /// form did not bring one.
    pub fn into_record(
        self,
        partition: &PartitionKey,
        base_currency: &str,
        rates: &RateTable,
    ) -> Result<LedgerRecord> {
        self.validate()?;
        let now = Utc::now().naive_utc();
        let id = match self.id {
            Some(id) if !id.trim().is_empty() => id.trim().to_string(),
            _ => Uuid::now_v7().to_string(),
        };
        let mut record = LedgerRecord {
            id,
            source_module: partition.module_id.clone(),
            source_tab: partition.tab_id.clone(),
            date: self.date,
            code: self.code.trim().to_string(),
            amount: self.amount,
            currency: normalize_currency(&self.currency),
            exchange_rate: self.exchange_rate,
            converted_amount: None,
            details: self.details,
            created_at: now,
            updated_at: now,
        };
        record.rederive(base_currency, rates)?;
        Ok(record)
    }
}

/// Field patch for an existing record. Absent fields are left unchanged.
///
/// `source_module` / `source_tab` may carry the origin tag the client saw in
/// an aggregate view; when omitted the router looks the record up itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecordUpdate {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_module: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_tab: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange_rate: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<RecordDetails>,
}

impl LedgerRecordUpdate {
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::MissingField("id".to_string()).into());
        }
        if let Some(code) = &self.code {
            if code.trim().is_empty() {
                return Err(ValidationError::MissingField("code".to_string()).into());
            }
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        if let Some(currency) = &self.currency {
            validate_currency(currency)?;
        }
        validate_rate(self.exchange_rate)?;
        if let Some(details) = &self.details {
            details.validate()?;
        }
        Ok(())
    }

    /// The origin tag carried by the patch, when both halves are present.
    pub fn origin_hint(&self) -> Option<PartitionKey> {
        match (&self.source_module, &self.source_tab) {
            (Some(module_id), Some(tab_id)) => Some(PartitionKey::new(module_id, tab_id)),
            _ => None,
        }
    }
}

pub(crate) fn normalize_currency(currency: &str) -> String {
    currency.trim().to_ascii_uppercase()
}

fn validate_amount(amount: Decimal) -> Result<()> {
    if amount < Decimal::ZERO {
        return Err(Error::Validation(ValidationError::InvalidInput(
            "amount cannot be negative".to_string(),
        )));
    }
    Ok(())
}

fn validate_currency(currency: &str) -> Result<()> {
    let code = currency.trim();
    if code.is_empty() {
        return Err(ValidationError::MissingField("currency".to_string()).into());
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(Error::Validation(ValidationError::InvalidInput(format!(
            "'{}' is not a three-letter currency code",
            currency
        ))));
    }
    Ok(())
}

fn validate_rate(rate: Option<Decimal>) -> Result<()> {
    match rate {
        Some(rate) if rate <= Decimal::ZERO => Err(Error::Validation(
            ValidationError::InvalidInput("exchange rate must be positive".to_string()),
        )),
        _ => Ok(()),
    }
}

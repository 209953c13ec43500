//! Ledger view models.

use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::partitions::{LedgerFamily, PartitionKey};
use crate::records::LedgerRecord;

/// The partition a view is mounted on and, for a mother tab, the partitions
/// it merges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewContext {
    pub family: LedgerFamily,
    pub partition: PartitionKey,
    pub is_aggregate: bool,
    pub sources: Vec<PartitionKey>,
}

impl ViewContext {
    pub fn native(family: LedgerFamily, partition: PartitionKey) -> Self {
        Self {
            family,
            partition,
            is_aggregate: false,
            sources: Vec::new(),
        }
    }

    pub fn aggregate(
        family: LedgerFamily,
        partition: PartitionKey,
        sources: Vec<PartitionKey>,
    ) -> Self {
        Self {
            family,
            partition,
            is_aggregate: true,
            sources,
        }
    }

    /// Canonical key of a partition this view may write to, if `key` is one.
    pub fn member(&self, key: &PartitionKey) -> Option<&PartitionKey> {
        if self.partition.matches(key) {
            return Some(&self.partition);
        }
        self.sources.iter().find(|source| source.matches(key))
    }
}

/// Totals shown under a ledger table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ViewSummary {
    pub record_count: usize,
    /// Sum of base-currency amounts and converted foreign amounts.
    pub total_base: Decimal,
    /// Raw amount totals per currency code.
    pub totals_by_currency: BTreeMap<String, Decimal>,
    /// Record counts per origin partition, keyed `module/tab`.
    pub counts_by_origin: BTreeMap<String, usize>,
    /// Foreign records with no converted amount, and records whose amount no
    /// longer fits in the total; excluded from `total_base`.
    pub unconverted_count: usize,
}

impl ViewSummary {
    pub fn from_records(records: &[LedgerRecord], base_currency: &str) -> Self {
        let mut summary = ViewSummary {
            record_count: records.len(),
            ..Default::default()
        };
        for record in records {
            match record
                .base_amount(base_currency)
                .and_then(|amount| summary.total_base.checked_add(amount))
            {
                Some(total) => summary.total_base = total,
                None => summary.unconverted_count += 1,
            }
            let total = summary
                .totals_by_currency
                .entry(record.currency.clone())
                .or_insert(Decimal::ZERO);
            match total.checked_add(record.amount) {
                Some(sum) => *total = sum,
                None => {
                    warn!("{} total saturated at record {}", record.currency, record.id);
                    *total = Decimal::MAX;
                }
            }
            *summary
                .counts_by_origin
                .entry(record.origin().to_string())
                .or_insert(0) += 1;
        }
        summary
    }
}

/// What a ledger screen renders: the records plus enough context to route
/// edits made on them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerView {
    #[serde(flatten)]
    pub context: ViewContext,
    pub base_currency: String,
    pub records: Vec<LedgerRecord>,
    pub summary: ViewSummary,
}

impl LedgerView {
    pub fn new(context: ViewContext, base_currency: &str, records: Vec<LedgerRecord>) -> Self {
        let summary = ViewSummary::from_records(&records, base_currency);
        Self {
            context,
            base_currency: base_currency.to_string(),
            records,
            summary,
        }
    }
}

//! Partition identity models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{Error, LedgerError, Result};

/// Template family a ledger belongs to. Each family persists under its own prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LedgerFamily {
    Capital,
    Expense,
    Sheet,
}

impl LedgerFamily {
    pub const ALL: [LedgerFamily; 3] = [
        LedgerFamily::Capital,
        LedgerFamily::Expense,
        LedgerFamily::Sheet,
    ];

    /// Storage key prefix for the family.
    pub fn prefix(&self) -> &'static str {
        match self {
            LedgerFamily::Capital => "capital",
            LedgerFamily::Expense => "expense",
            LedgerFamily::Sheet => "sheet",
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.prefix()
    }
}

impl fmt::Display for LedgerFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LedgerFamily {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "capital" => Ok(LedgerFamily::Capital),
            "expense" | "expenses" => Ok(LedgerFamily::Expense),
            "sheet" | "sheets" => Ok(LedgerFamily::Sheet),
            other => Err(LedgerError::UnknownFamily(other.to_string()).into()),
        }
    }
}

/// Identity of one persisted collection: the owning module and tab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionKey {
    pub module_id: String,
    pub tab_id: String,
}

impl PartitionKey {
    /// Creates a key, trimming surrounding whitespace from both identifiers.
    pub fn new(module_id: impl AsRef<str>, tab_id: impl AsRef<str>) -> Self {
        Self {
            module_id: module_id.as_ref().trim().to_string(),
            tab_id: tab_id.as_ref().trim().to_string(),
        }
    }

    /// Checks the identifiers keep `storage_key` injective.
    ///
    /// The module id is the only segment that may not contain the separator:
    /// with a fixed prefix and an underscore-free module id, the first `_`
    /// after the prefix always ends the module segment.
    pub fn validate(&self) -> Result<()> {
        if self.module_id.is_empty() {
            return Err(LedgerError::InvalidPartition("module id cannot be empty".into()).into());
        }
        if self.tab_id.is_empty() {
            return Err(LedgerError::InvalidPartition("tab id cannot be empty".into()).into());
        }
        if self.module_id.contains('_') {
            return Err(LedgerError::InvalidPartition(format!(
                "module id '{}' cannot contain '_'",
                self.module_id
            ))
            .into());
        }
        Ok(())
    }

    /// Whether two keys name the same tab under the app's fuzzy tab matching.
    ///
    /// Module ids compare case-insensitively; tab ids compare after
    /// [`normalize_tab_name`].
    pub fn matches(&self, other: &PartitionKey) -> bool {
        self.module_id.eq_ignore_ascii_case(&other.module_id)
            && normalize_tab_name(&self.tab_id) == normalize_tab_name(&other.tab_id)
    }
}

impl fmt::Display for PartitionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.module_id, self.tab_id)
    }
}

/// Builds the persisted key `"<prefix>_<moduleId>_<tabId>"`.
pub fn storage_key(family: LedgerFamily, key: &PartitionKey) -> String {
    format!("{}_{}_{}", family.prefix(), key.module_id, key.tab_id)
}

/// Normalizes a tab name for comparison: trimmed, lowercased, inner
/// whitespace runs collapsed to a single space.
pub fn normalize_tab_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Metadata about a persisted partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionInfo {
    pub family: LedgerFamily,
    pub partition: PartitionKey,
    pub storage_key: String,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_key_layout() {
        let key = PartitionKey::new("kenya", "Capital");
        assert_eq!(storage_key(LedgerFamily::Capital, &key), "capital_kenya_Capital");
        assert_eq!(storage_key(LedgerFamily::Expense, &key), "expense_kenya_Capital");
    }

    #[test]
    fn test_new_trims_identifiers() {
        let key = PartitionKey::new("  payable ", " Capital  ");
        assert_eq!(key, PartitionKey::new("payable", "Capital"));
    }

    #[test]
    fn test_normalize_tab_name() {
        assert_eq!(normalize_tab_name("  All   Stones "), "all stones");
        assert_eq!(normalize_tab_name("CAPITAL"), "capital");
        assert_eq!(normalize_tab_name("Rough\tStock"), "rough stock");
    }

    #[test]
    fn test_matches_uses_tab_normalization() {
        let canonical = PartitionKey::new("payable", "All Capital");
        assert!(canonical.matches(&PartitionKey::new("Payable", " all   capital")));
        assert!(!canonical.matches(&PartitionKey::new("payable", "allcapital")));
        assert!(!canonical.matches(&PartitionKey::new("kenya", "All Capital")));
    }

    #[test]
    fn test_validate_rejects_ambiguous_keys() {
        assert!(PartitionKey::new("", "Capital").validate().is_err());
        assert!(PartitionKey::new("kenya", " ").validate().is_err());
        assert!(PartitionKey::new("sri_lanka", "Capital").validate().is_err());
        assert!(PartitionKey::new("kenya", "Rough_Stones").validate().is_ok());
    }

    #[test]
    fn test_family_parsing() {
        assert_eq!("Capital".parse::<LedgerFamily>().unwrap(), LedgerFamily::Capital);
        assert_eq!("expenses".parse::<LedgerFamily>().unwrap(), LedgerFamily::Expense);
        assert_eq!("sheet".parse::<LedgerFamily>().unwrap(), LedgerFamily::Sheet);
        assert!("inventory".parse::<LedgerFamily>().is_err());
    }
}

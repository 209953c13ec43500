//! Aggregation topology: which partitions a mother tab displays.

use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::partitions_model::{LedgerFamily, PartitionKey};
use crate::errors::{Error, LedgerError, Result};

/// One aggregate view: a root partition that displays the union of `sources`
/// plus its own records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartitionTopology {
    pub family: LedgerFamily,
    pub root: PartitionKey,
    pub sources: Vec<PartitionKey>,
}

impl PartitionTopology {
    pub fn new(family: LedgerFamily, root: PartitionKey, sources: Vec<PartitionKey>) -> Self {
        Self {
            family,
            root,
            sources,
        }
    }

    /// Returns the canonical source key matching `key`, if it feeds this view.
    pub fn source_matching(&self, key: &PartitionKey) -> Option<&PartitionKey> {
        self.sources.iter().find(|source| source.matches(key))
    }

    fn validate(&self) -> Result<()> {
        self.root.validate()?;
        let mut seen: HashSet<(String, String)> = HashSet::new();
        for source in &self.sources {
            source.validate()?;
            if source.matches(&self.root) {
                return Err(LedgerError::InvalidTopology(format!(
                    "{} {} lists itself as a source",
                    self.family, self.root
                ))
                .into());
            }
            let identity = (
                source.module_id.to_ascii_lowercase(),
                super::normalize_tab_name(&source.tab_id),
            );
            if !seen.insert(identity) {
                return Err(LedgerError::InvalidTopology(format!(
                    "{} {} lists source {} twice",
                    self.family, self.root, source
                ))
                .into());
            }
        }
        Ok(())
    }
}

/// The declarative set of aggregate views, shared by every template family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopologyRegistry {
    topologies: Vec<PartitionTopology>,
}

impl TopologyRegistry {
    /// Builds a validated registry.
    pub fn new(topologies: Vec<PartitionTopology>) -> Result<Self> {
        let registry = Self { topologies };
        registry.validate()?;
        Ok(registry)
    }

    /// Parses a JSON array of topologies, as found in a topology override file.
    pub fn from_json(json: &str) -> Result<Self> {
        let topologies: Vec<PartitionTopology> = serde_json::from_str(json).map_err(|e| {
            Error::InvalidConfigValue(format!("topology file is not valid JSON: {}", e))
        })?;
        debug!("Loaded {} aggregation topologies", topologies.len());
        Self::new(topologies)
    }

    /// The mother tabs of the back office and the tabs that feed them.
    pub fn builtin() -> Self {
        const REGIONS: [&str; 4] = ["kenya", "madagascar", "tanzania", "bangkok"];
        let sources = |tab: &str, regions: &[&str]| -> Vec<PartitionKey> {
            regions
                .iter()
                .map(|region| PartitionKey::new(region, tab))
                .collect()
        };

        let capital_sources = sources("Capital", &REGIONS);
        let expense_sources = sources("Expenses", &REGIONS);
        // No stones are held in Bangkok; it only books capital and expenses.
        let sheet_sources = sources("Stones", &REGIONS[..3]);

        Self {
            topologies: vec![
                PartitionTopology::new(
                    LedgerFamily::Capital,
                    PartitionKey::new("payable", "Capital"),
                    capital_sources,
                ),
                PartitionTopology::new(
                    LedgerFamily::Expense,
                    PartitionKey::new("payable", "Expenses"),
                    expense_sources,
                ),
                PartitionTopology::new(
                    LedgerFamily::Sheet,
                    PartitionKey::new("inventory", "All Stones"),
                    sheet_sources,
                ),
            ],
        }
    }

    pub fn topologies(&self) -> &[PartitionTopology] {
        &self.topologies
    }

    /// Finds the topology whose root is `key`, using tab-name normalization.
    pub fn find_root(
        &self,
        family: LedgerFamily,
        key: &PartitionKey,
    ) -> Option<&PartitionTopology> {
        self.topologies
            .iter()
            .find(|topology| topology.family == family && topology.root.matches(key))
    }

    /// Finds a root for `key` in any family.
    pub fn find_root_any_family(&self, key: &PartitionKey) -> Option<&PartitionTopology> {
        self.topologies
            .iter()
            .find(|topology| topology.root.matches(key))
    }

    /// Aggregate roots that `key` contributes records to.
    pub fn roots_fed_by(
        &self,
        family: LedgerFamily,
        key: &PartitionKey,
    ) -> Vec<&PartitionTopology> {
        self.topologies
            .iter()
            .filter(|topology| topology.family == family && topology.source_matching(key).is_some())
            .collect()
    }

    /// Maps a user-supplied key onto the canonical spelling used by the
    /// registry, so `"payable", " capital"` reads and writes the same partition
    /// as `"payable", "Capital"`. Keys unknown to the registry are returned as is.
    pub fn canonicalize(&self, family: LedgerFamily, key: &PartitionKey) -> PartitionKey {
        for topology in self.topologies.iter().filter(|t| t.family == family) {
            if topology.root.matches(key) {
                return topology.root.clone();
            }
            if let Some(source) = topology.source_matching(key) {
                return source.clone();
            }
        }
        key.clone()
    }

    fn validate(&self) -> Result<()> {
        let mut roots: Vec<(LedgerFamily, &PartitionKey)> = Vec::new();
        for topology in &self.topologies {
            topology.validate()?;
            if roots
                .iter()
                .any(|(family, root)| *family == topology.family && root.matches(&topology.root))
            {
                return Err(LedgerError::InvalidTopology(format!(
                    "{} {} is declared as an aggregate root twice",
                    topology.family, topology.root
                ))
                .into());
            }
            roots.push((topology.family, &topology.root));
        }
        Ok(())
    }
}

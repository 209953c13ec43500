use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::errors::Result;
use crate::ledger::ViewContext;
use crate::partitions::{
    normalize_tab_name, storage_key, LedgerFamily, PartitionKey, TopologyRegistry,
};

/// How a tab is rendered and where its records live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedTab {
    #[serde(flatten)]
    pub view: ViewContext,
    pub storage_key: String,
    /// Mother tabs this partition's records also appear in.
    pub feeds: Vec<PartitionKey>,
}

/// Decides, for a module tab, which ledger family renders it and whether it
/// is a mother tab.
///
/// Tab names are compared after [`normalize_tab_name`], the same rule the
/// topology registry uses, so a tab renamed only by case or spacing keeps
/// its aggregation membership.
#[derive(Clone)]
pub struct TabResolver {
    registry: Arc<TopologyRegistry>,
}

impl TabResolver {
    pub fn new(registry: Arc<TopologyRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &TopologyRegistry {
        &self.registry
    }

    /// Resolves a tab whose family is not known yet.
    pub fn resolve(&self, module_id: &str, tab_id: &str) -> Result<ResolvedTab> {
        let key = PartitionKey::new(module_id, tab_id);
        key.validate()?;
        let family = match self.registry.find_root_any_family(&key) {
            Some(topology) => topology.family,
            None => family_for_tab(&key.tab_id),
        };
        self.resolve_in_family(family, &key)
    }

    /// Resolves a tab rendered by a known family.
    pub fn resolve_in_family(
        &self,
        family: LedgerFamily,
        key: &PartitionKey,
    ) -> Result<ResolvedTab> {
        let view = self.view_context(family, key)?;
        let feeds = self
            .registry
            .roots_fed_by(family, &view.partition)
            .into_iter()
            .map(|topology| topology.root.clone())
            .collect();
        Ok(ResolvedTab {
            storage_key: storage_key(family, &view.partition),
            view,
            feeds,
        })
    }

    /// The view a ledger screen mounts for `key`.
    pub fn view_context(&self, family: LedgerFamily, key: &PartitionKey) -> Result<ViewContext> {
        key.validate()?;
        let partition = self.registry.canonicalize(family, key);
        Ok(match self.registry.find_root(family, &partition) {
            Some(topology) => {
                ViewContext::aggregate(family, partition, topology.sources.clone())
            }
            None => ViewContext::native(family, partition),
        })
    }
}

/// Family implied by a tab's name when no topology claims it.
fn family_for_tab(tab_id: &str) -> LedgerFamily {
    let name = normalize_tab_name(tab_id);
    if name.contains("capital") {
        LedgerFamily::Capital
    } else if name.contains("expense") {
        LedgerFamily::Expense
    } else {
        LedgerFamily::Sheet
    }
}

//! Tabs module - resolves a (module, tab) pair to its ledger family and view.

mod tabs_resolver;

pub use tabs_resolver::{ResolvedTab, TabResolver};

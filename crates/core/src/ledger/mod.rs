//! Ledger module - partition sessions, aggregation and write-back routing.

mod aggregator;
mod ledger_model;
mod ledger_service;
mod ledger_session;
mod router;

#[cfg(test)]
mod ledger_service_tests;

pub use aggregator::Aggregator;
pub use ledger_model::{LedgerView, ViewContext, ViewSummary};
pub use ledger_service::{LedgerService, LedgerServiceTrait};
pub use ledger_session::{PartitionSession, SaveOutcome, SessionState};
pub use router::WriteBackRouter;

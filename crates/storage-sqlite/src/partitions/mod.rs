//! SQLite storage implementation for ledger partitions.

mod model;
mod repository;

pub use model::LedgerPartitionDB;
pub use repository::PartitionRepository;

// Re-export trait from core for convenience
pub use gemledger_core::partitions::PartitionRepositoryTrait;

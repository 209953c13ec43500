//! Gem Ledger Core - partitioned ledger records, aggregation and write-back routing.
//!
//! This crate contains the ledger's business logic. It is database-agnostic
//! and defines traits that are implemented by the `storage-sqlite` crate.

pub mod constants;
pub mod errors;
pub mod fx;
pub mod ledger;
pub mod partitions;
pub mod records;
pub mod settings;
pub mod tabs;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

//! Core error types for the ledger.
//!
//! This module defines database-agnostic error types. Storage-specific errors
//! (from Diesel, SQLite, etc.) are converted to these types by the storage layer.

use chrono::ParseError as ChronoParseError;
use thiserror::Error;

use crate::fx::FxError;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Root error type for the ledger.
///
/// Database-specific errors are wrapped in string form to keep this type
/// database-agnostic.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Database operation failed: {0}")]
    Database(#[from] DatabaseError),

    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Fx error: {0}")]
    Fx(#[from] FxError),

    #[error("Invalid configuration value: {0}")]
    InvalidConfigValue(String),

    #[error("Repository error: {0}")]
    Repository(String),
}

/// Database-agnostic error type for storage operations.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to establish a database connection.
    #[error("Failed to connect to database: {0}")]
    ConnectionFailed(String),

    /// Failed to create or configure the connection pool.
    #[error("Failed to create database pool: {0}")]
    PoolCreationFailed(String),

    /// A database query failed to execute.
    #[error("Database query failed: {0}")]
    QueryFailed(String),

    /// The requested row was not found.
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Database migration failed.
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// Internal/unexpected database error.
    #[error("Internal database error: {0}")]
    Internal(String),
}

/// Errors raised by partition and record operations.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Record '{id}' not found in partition {partition}")]
    RecordNotFound { id: String, partition: String },

    #[error("Record '{id}' already exists in partition {partition}")]
    DuplicateRecord { id: String, partition: String },

    #[error("Invalid partition key: {0}")]
    InvalidPartition(String),

    #[error("Unknown ledger family: {0}")]
    UnknownFamily(String),

    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    #[error("Record belongs to a {actual} ledger, expected {expected}")]
    FamilyMismatch { expected: String, actual: String },
}

/// Validation errors for user input and data parsing.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Required field '{0}' is missing")]
    MissingField(String),

    #[error("Failed to parse decimal number: {0}")]
    DecimalParse(#[from] rust_decimal::Error),

    #[error("Failed to parse date/time: {0}")]
    DateTimeParse(#[from] ChronoParseError),
}

impl Error {
    /// True when the error was caused by caller input rather than storage.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::Fx(FxError::InvalidRate(_))
                | Error::Fx(FxError::RateNotFound(_))
                | Error::Fx(FxError::InvalidCurrencyCode(_))
                | Error::Fx(FxError::AmountOverflow(_))
                | Error::Ledger(LedgerError::InvalidPartition(_))
                | Error::Ledger(LedgerError::UnknownFamily(_))
                | Error::Ledger(LedgerError::DuplicateRecord { .. })
                | Error::Ledger(LedgerError::FamilyMismatch { .. })
        )
    }

    /// True when the error means the addressed record or row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::Ledger(LedgerError::RecordNotFound { .. })
                | Error::Database(DatabaseError::NotFound(_))
        )
    }
}

// === From implementations for common error types ===

impl From<rust_decimal::Error> for Error {
    fn from(err: rust_decimal::Error) -> Self {
        Error::Validation(ValidationError::DecimalParse(err))
    }
}

impl From<ChronoParseError> for Error {
    fn from(err: ChronoParseError) -> Self {
        Error::Validation(ValidationError::DateTimeParse(err))
    }
}

impl From<Error> for String {
    fn from(err: Error) -> Self {
        err.to_string()
    }
}

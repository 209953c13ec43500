//! FX (Foreign Exchange) module - base-currency conversion for ledger records.

mod conversion;
mod fx_errors;
mod rate_table;

pub use conversion::{convert, derive_amount, is_base_currency, DerivedAmount};
pub use fx_errors::FxError;
pub use rate_table::RateTable;

//! Records module - ledger rows, pure edits and whole-partition load/save.

mod records_model;
mod records_ops;
mod records_store;


pub use records_model::{
    CapitalDetails, ExpenseDetails, LedgerRecord, LedgerRecordUpdate, NewLedgerRecord,
    RecordDetails, SheetDetails,
};
pub use records_ops::{delete_record, find_record, insert_record, update_record};
pub use records_store::PartitionStore;

//! I/O module
//!
//! Handles operation script parsing and the account report.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (row conversion, report serialization)
//! - `sync_reader` - Synchronous script reader with iterator interface
//! - `async_reader` - Asynchronous script reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{
    convert_script_row, write_accounts_csv, AccountReport, ScriptCommand, ScriptRecord, ScriptRow,
};
pub use sync_reader::SyncReader;

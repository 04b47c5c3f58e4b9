//! Synchronous script reader with iterator interface
//!
//! Streams script records from a CSV file one row at a time, delegating
//! format concerns to the `csv_format` module.
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors, unreadable header) are returned from `new()`
//! - Malformed rows are yielded as `Err(LedgerError::ParseError)` with their line number
//!
//! ```no_run
//! use ledger_engine::io::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("script.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("line {}: {:?}", record.line, record.command),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```

use crate::io::csv_format::{convert_script_row, ScriptRecord, ScriptRow};
use crate::types::LedgerError;
use csv::{ReaderBuilder, StringRecord, Trim};
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

/// Synchronous CSV script reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    headers: StringRecord,
    record: StringRecord,
}

impl SyncReader {
    /// Open a script file for streaming iteration
    ///
    /// The CSV reader is configured to trim whitespace from all fields and to
    /// accept rows with fewer fields than the header.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::FileNotFound`] if the path does not exist
    /// - [`LedgerError::IoError`] / [`LedgerError::ParseError`] if the file or
    ///   its header cannot be read
    pub fn new(path: &Path) -> Result<Self, LedgerError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => LedgerError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => LedgerError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            },
        })?;

        let mut reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .buffer_capacity(8 * 1024)
            .from_reader(file);
        let headers = reader.headers()?.clone();

        Ok(Self {
            reader,
            headers,
            record: StringRecord::new(),
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<ScriptRecord, LedgerError>;

    /// Read, deserialize and convert the next row
    fn next(&mut self) -> Option<Self::Item> {
        match self.reader.read_record(&mut self.record) {
            Ok(false) => None,
            Ok(true) => {
                let line = self.record.position().map_or(0, |pos| pos.line());
                let parsed = self
                    .record
                    .deserialize::<ScriptRow>(Some(&self.headers))
                    .map_err(LedgerError::from)
                    .and_then(|row| convert_script_row(row, line))
                    .map(|command| ScriptRecord { line, command });
                Some(parsed)
            }
            Err(e) => Some(Err(e.into())),
        }
    }
}

//! Asynchronous script reader with batch interface
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - any `futures::io::AsyncRead` source (a tokio file goes through `tokio_util::compat`)
//! - batch reading so callers can bound how much of the script is in flight
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of Result<ScriptRecord, LedgerError>
//!                  ↓
//!           csv_format module
//!           (ScriptRow, convert_script_row)
//! ```

use crate::io::csv_format::{convert_script_row, ScriptRecord, ScriptRow};
use crate::types::LedgerError;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;

/// Asynchronous CSV script reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    /// Data rows consumed so far; the header is line 1
    rows_read: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            rows_read: 0,
        }
    }

    /// Read up to `batch_size` rows
    ///
    /// Malformed rows are returned as errors in place so the caller can
    /// count them. An empty batch means the end of the script.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<Result<ScriptRecord, LedgerError>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut rows = self.csv_reader.deserialize::<ScriptRow>();

        while batch.len() < batch_size {
            let Some(next) = rows.next().await else {
                break;
            };
            self.rows_read += 1;
            let line = self.rows_read + 1;

            let parsed = match next {
                Ok(row) => convert_script_row(row, line).map(|command| ScriptRecord { line, command }),
                Err(e) => Err(LedgerError::ParseError {
                    line: Some(line),
                    message: e.to_string(),
                }),
            };
            batch.push(parsed);
        }

        batch
    }

    /// Read every remaining row
    pub async fn read_all(&mut self, batch_size: usize) -> Vec<Result<ScriptRecord, LedgerError>> {
        let mut all = Vec::new();
        loop {
            let batch = self.read_batch(batch_size.max(1)).await;
            if batch.is_empty() {
                break;
            }
            all.extend(batch);
        }
        all
    }
}

//! Asynchronous CSV reader with batch interface
//!
//! Provides a streaming interface over ledger commands from a replay file.
//! Supports batch reading for concurrent replay.
//!
//! # Design
//!
//! The AsyncReader uses:
//! - csv-async for streaming CSV parsing
//! - futures for the record stream
//! - Batch reading so the replay loop can hand fixed-size chunks to the
//!   batch processor
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of LedgerCommands
//!                  ↓
//!           csv_format module
//!           (CsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CsvRecord};
use crate::types::LedgerCommand;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous CSV reader
///
/// Provides batch reading interface over ledger commands.
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .flexible(true)
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self { csv_reader }
    }

    /// Read up to `batch_size` commands
    ///
    /// Invalid rows are logged and skipped. Returns an empty vector at the end
    /// of the file.
    pub async fn read_batch(&mut self, batch_size: usize) -> Vec<LedgerCommand> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CsvRecord>();

        while batch.len() < batch_size {
            match records.next().await {
                Some(Ok(csv_record)) => match convert_csv_record(csv_record) {
                    Ok(command) => batch.push(command),
                    Err(e) => warn!(error = %e, "skipping unconvertible row"),
                },
                Some(Err(e)) => warn!(error = %e, "skipping unparsable row"),
                None => break,
            }
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "command,account,counterparty,amount,name\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_read_batch() {
        let mut async_reader = reader(
            "open,,,,alice\n\
             open,,,,bob\n\
             transfer,1,2,5.25,\n",
        );

        let batch = async_reader.read_batch(2).await;
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].name(), "open");
        assert_eq!(batch[1].name(), "open");

        let batch = async_reader.read_batch(2).await;
        assert_eq!(
            batch,
            vec![LedgerCommand::Transfer {
                source: 1,
                destination: 2,
                amount: Decimal::new(525, 2)
            }]
        );

        assert!(async_reader.read_batch(2).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");

        assert!(async_reader.read_batch(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let mut async_reader = reader(
            "bogus,1,2,3,\n\
             seed,x,,10,\n\
             seed,1,,10,\n",
        );

        let batch = async_reader.read_batch(10).await;

        assert_eq!(
            batch,
            vec![LedgerCommand::Seed {
                account: 1,
                amount: Decimal::new(10, 0)
            }]
        );
    }

    #[tokio::test]
    async fn test_async_reader_whitespace_handling() {
        let mut async_reader = reader("  open  ,  ,  ,  ,  carol  \n");

        let batch = async_reader.read_batch(10).await;

        assert_eq!(
            batch,
            vec![LedgerCommand::Open {
                name: "carol".to_string()
            }]
        );
    }
}

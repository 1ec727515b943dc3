//! Asynchronous coupon snapshot reader
//!
//! Reads the coupons of a snapshot CSV in batches.
//!
//! # Architecture
//!
//! ```text
//! CSV Reader → AsyncReader → Batches of CouponRecords
//!                  ↓
//!           csv_format module
//!           (CouponCsvRecord, convert_csv_record)
//! ```

use crate::io::csv_format::{convert_csv_record, CouponCsvRecord};
use crate::types::CouponRecord;
use csv_async::AsyncReaderBuilder;
use futures::io::AsyncRead;
use futures::stream::StreamExt;
use tracing::warn;

/// Asynchronous snapshot reader
pub struct AsyncReader<R: AsyncRead + Unpin> {
    csv_reader: csv_async::AsyncDeserializer<R>,
    line_num: u64,
}

impl<R: AsyncRead + Unpin + Send + 'static> AsyncReader<R> {
    pub fn new(reader: R) -> Self {
        let csv_reader = AsyncReaderBuilder::new()
            .trim(csv_async::Trim::All)
            .create_deserializer(reader);

        Self {
            csv_reader,
            line_num: 1,
        }
    }

    /// Read a batch of coupons
    ///
    /// Reads up to `batch_size` rows. Invalid rows are logged with their line
    /// and skipped, so a batch may hold fewer coupons than rows read, or none.
    ///
    /// # Returns
    ///
    /// The converted coupons, or `None` once the end of the file is reached.
    pub async fn read_batch(&mut self, batch_size: usize) -> Option<Vec<CouponRecord>> {
        let mut batch = Vec::with_capacity(batch_size);
        let mut records = self.csv_reader.deserialize::<CouponCsvRecord>();
        let mut rows = 0;

        while rows < batch_size {
            let Some(row) = records.next().await else {
                break;
            };
            rows += 1;
            self.line_num += 1;

            match row {
                Ok(csv_record) => match convert_csv_record(csv_record) {
                    Ok(coupon) => batch.push(coupon),
                    Err(error) => warn!(line = self.line_num, %error, "Skipping coupon row"),
                },
                Err(error) => warn!(line = self.line_num, %error, "CSV parse error"),
            }
        }

        (rows > 0).then_some(batch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::io::Cursor;
    use rust_decimal::Decimal;

    const HEADER: &str = "id,code,program_id,partner_id,balance\n";

    fn reader(rows: &str) -> AsyncReader<Cursor<Vec<u8>>> {
        AsyncReader::new(Cursor::new(format!("{}{}", HEADER, rows).into_bytes()))
    }

    #[tokio::test]
    async fn test_async_reader_multiple_batches() {
        let mut async_reader = reader("1,,1,,10\n2,,1,,20\n3,,1,,30\n");

        let batch = async_reader.read_batch(2).await.unwrap();
        assert_eq!(batch.iter().map(|c| c.id).collect::<Vec<_>>(), vec![1, 2]);

        let batch = async_reader.read_batch(2).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].balance, Decimal::new(30, 0));

        assert_eq!(async_reader.read_batch(2).await, None);
    }

    #[tokio::test]
    async fn test_async_reader_empty_csv() {
        let mut async_reader = reader("");

        assert_eq!(async_reader.read_batch(10).await, None);
    }

    #[tokio::test]
    async fn test_async_reader_skips_invalid_rows() {
        let mut async_reader = reader("1,,1,,ten\nx,,1,,5\n3,GIFT,1,9,5\n");

        let batch = async_reader.read_batch(10).await;
        assert_eq!(
            batch,
            Some(vec![CouponRecord::new(3, Some("GIFT".to_string()), 1, Some(9), Decimal::new(5, 0))])
        );
    }

    #[tokio::test]
    async fn test_async_reader_invalid_rows_do_not_end_the_file() {
        let mut async_reader = reader("1,,1,,ten\n2,,1,,20\n");

        let first = async_reader.read_batch(1).await;
        assert_eq!(first, Some(vec![]));

        let second = async_reader.read_batch(1).await.unwrap();
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, 2);
    }
}

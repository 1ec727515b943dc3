//! Synchronous coupon snapshot reader with iterator interface
//!
//! Provides a streaming iterator over the coupons of a snapshot CSV file.
//! Delegates CSV format concerns to the csv_format module.
//!
//! # Iterator Interface
//!
//! SyncReader implements the Iterator trait, yielding
//! `Result<CouponRecord, LoyaltyError>` for each CSV row:
//!
//! ```no_run
//! use pos_loyalty_sync::io::sync_reader::SyncReader;
//! use std::path::Path;
//!
//! let reader = SyncReader::new(Path::new("coupons.csv")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(coupon) => println!("Loaded coupon: {:?}", coupon),
//!         Err(e) => eprintln!("Error: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found) are returned from `new()`
//! - Row errors are yielded as `LoyaltyError::ParseError` with the file line,
//!   header included, and iteration goes on with the next row. Malformed rows
//!   take the line from the CSV reader's position.

use crate::io::csv_format::{convert_csv_record, CouponCsvRecord};
use crate::types::{CouponRecord, LoyaltyError};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::path::Path;

/// Synchronous snapshot reader
#[derive(Debug)]
pub struct SyncReader {
    reader: csv::Reader<File>,
    line_num: u64,
}

impl SyncReader {
    /// Open a snapshot file
    ///
    /// The CSV reader trims whitespace from all fields and uses an 8KB buffer.
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::IoError` if the file could not be opened.
    pub fn new(path: &Path) -> Result<Self, LoyaltyError> {
        let file = File::open(path).map_err(|e| LoyaltyError::IoError {
            message: format!("Failed to open file '{}': {}", path.display(), e),
        })?;

        let reader = ReaderBuilder::new()
            .trim(Trim::All)
            .buffer_capacity(8 * 1024)
            .from_reader(file);

        Ok(Self {
            reader,
            line_num: 1,
        })
    }
}

impl Iterator for SyncReader {
    type Item = Result<CouponRecord, LoyaltyError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut deserializer = self.reader.deserialize::<CouponCsvRecord>();
        let row = deserializer.next()?;
        self.line_num += 1;

        Some(match row {
            Ok(csv_record) => {
                convert_csv_record(csv_record).map_err(|message| LoyaltyError::ParseError {
                    line: Some(self.line_num),
                    message,
                })
            }
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary CSV file for testing
    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_sync_reader_fails_on_missing_file() {
        let result = SyncReader::new(Path::new("nonexistent.csv"));
        assert!(matches!(result, Err(LoyaltyError::IoError { .. })));
        assert!(result.unwrap_err().to_string().contains("Failed to open file"));
    }

    #[test]
    fn test_sync_reader_iterates_coupons() {
        let file = create_temp_csv(
            "id,code,program_id,partner_id,balance\n7,C7,1,3,40\n-5,,2,,0\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            Ok(CouponRecord::new(7, Some("C7".to_string()), 1, Some(3), Decimal::new(40, 0)))
        );
        assert_eq!(
            records[1],
            Ok(CouponRecord::new(-5, None, 2, None, Decimal::ZERO))
        );
    }

    #[test]
    fn test_sync_reader_reports_line_and_continues() {
        let file = create_temp_csv(
            "id,code,program_id,partner_id,balance\n1,,1,,5\n2,,1,,lots\nx,,1,,5\n4,,1,,5\n",
        );

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();

        assert_eq!(records.len(), 4);
        assert!(records[0].is_ok());
        assert_eq!(
            records[1],
            Err(LoyaltyError::ParseError {
                line: Some(3),
                message: "Invalid balance 'lots' for coupon 2".to_string()
            })
        );
        assert!(matches!(
            records[2],
            Err(LoyaltyError::ParseError { line: Some(4), .. })
        ));
        assert_eq!(records[3].as_ref().unwrap().id, 4);
    }

    #[test]
    fn test_sync_reader_handles_whitespace() {
        let file = create_temp_csv("id,code,program_id,partner_id,balance\n  9 , WELCOME , 2 ,  , 1.5 \n");

        let records: Vec<_> = SyncReader::new(file.path())
            .unwrap()
            .filter_map(Result::ok)
            .collect();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].code.as_deref(), Some("WELCOME"));
        assert_eq!(records[0].balance, Decimal::new(15, 1));
    }

    #[test]
    fn test_sync_reader_handles_empty_file_after_header() {
        let file = create_temp_csv("id,code,program_id,partner_id,balance\n");

        let records: Vec<_> = SyncReader::new(file.path()).unwrap().collect();
        assert!(records.is_empty());
    }
}

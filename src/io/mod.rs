//! I/O module
//!
//! Handles coupon snapshot parsing and output.
//!
//! # Components
//!
//! - `csv_format` - CSV format handling (record conversion, output serialization)
//! - `sync_reader` - Synchronous snapshot reader with iterator interface
//! - `async_reader` - Asynchronous snapshot reader with batch reading interface

pub mod async_reader;
pub mod csv_format;
pub mod sync_reader;

pub use async_reader::AsyncReader;
pub use csv_format::{convert_csv_record, write_coupons_csv, CouponCsvRecord};
pub use sync_reader::SyncReader;

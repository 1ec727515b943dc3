//! CSV format of coupon snapshots
//!
//! This module centralizes all CSV format concerns, providing:
//! - CouponCsvRecord structure for deserialization
//! - Conversion from CSV records to coupon records
//! - Coupon cache output serialization
//!
//! The snapshot columns are `id,code,program_id,partner_id,balance`. `code` and
//! `partner_id` may be empty. All functions are pure (no I/O) for easy testing.

use crate::types::{CouponId, CouponRecord, LoyaltyError, PartnerId, ProgramId};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// CSV record structure for deserialization
///
/// The balance is kept as text so that a malformed figure is reported with
/// the coupon it belongs to.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CouponCsvRecord {
    pub id: CouponId,
    pub code: Option<String>,
    pub program_id: ProgramId,
    pub partner_id: Option<PartnerId>,
    pub balance: String,
}

/// Convert a CouponCsvRecord to a CouponRecord
///
/// # Arguments
///
/// * `csv_record` - The deserialized CSV record
///
/// # Returns
///
/// Result containing either:
/// - Ok(CouponRecord) - Successfully converted record
/// - Err(String) - Error message describing the conversion failure
pub fn convert_csv_record(csv_record: CouponCsvRecord) -> Result<CouponRecord, String> {
    let balance_str = csv_record.balance.trim();
    if balance_str.is_empty() {
        return Err(format!("Coupon {} has no balance", csv_record.id));
    }

    let balance = Decimal::from_str(balance_str).map_err(|_| {
        format!(
            "Invalid balance '{}' for coupon {}",
            csv_record.balance, csv_record.id
        )
    })?;

    let code = csv_record.code.filter(|code| !code.trim().is_empty());

    Ok(CouponRecord::new(
        csv_record.id,
        code,
        csv_record.program_id,
        csv_record.partner_id,
        balance,
    ))
}

/// Write coupons to CSV format
///
/// Coupons are sorted by id for deterministic output and balances are rounded
/// half away from zero to four decimal places.
///
/// # Errors
///
/// Returns `LoyaltyError::IoError` if the output cannot be written.
pub fn write_coupons_csv(
    coupons: &[&CouponRecord],
    output: &mut dyn Write,
) -> Result<(), LoyaltyError> {
    use csv::Writer;

    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["id", "code", "program_id", "partner_id", "balance"])
        .map_err(|e| write_error("header", e))?;

    let mut sorted_coupons = coupons.to_vec();
    sorted_coupons.sort_by_key(|coupon| coupon.id);

    for coupon in sorted_coupons {
        writer
            .write_record(&[
                coupon.id.to_string(),
                coupon.code.clone().unwrap_or_default(),
                coupon.program_id.to_string(),
                coupon
                    .partner_id
                    .map(|id| id.to_string())
                    .unwrap_or_default(),
                format!(
                    "{:.4}",
                    coupon
                        .balance
                        .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
                ),
            ])
            .map_err(|e| write_error("coupon record", e))?;
    }

    writer.flush()?;

    Ok(())
}

fn write_error(what: &str, error: csv::Error) -> LoyaltyError {
    LoyaltyError::IoError {
        message: format!("Failed to write CSV {}: {}", what, error),
    }
}

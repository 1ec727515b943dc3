//! Wire types of the two coupon RPC methods
//!
//! `validate_coupon_programs` checks pending point changes before the order is
//! committed. `confirm_coupon_programs` sends the final coupon usage once the
//! order is stored server-side and returns the authoritative coupon state.

use super::coupon::{CouponId, OrderId, PartnerId, ProgramId};
use rust_decimal::Decimal;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Arguments of `validate_coupon_programs`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidateCouponsRequest {
    /// Always empty: nothing is committed yet
    pub order_ids: Vec<OrderId>,
    pub point_changes: BTreeMap<CouponId, Decimal>,
    pub new_codes: Vec<String>,
}

/// Result of `validate_coupon_programs`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub successful: bool,

    #[serde(default)]
    pub payload: ValidationPayload,
}

/// Corrections returned by the pre-check, present on success and failure alike
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ValidationPayload {
    #[serde(default)]
    pub message: Option<String>,

    /// Authoritative balances of the coupons involved
    #[serde(default)]
    pub updated_points: BTreeMap<CouponId, Decimal>,

    /// Coupons invalidated server-side, e.g. redeemed on another terminal
    #[serde(default)]
    pub removed_coupons: Vec<CouponId>,
}

/// Final usage of one coupon by a committed order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponDataEntry {
    pub points: Decimal,
    pub program_id: ProgramId,
    pub coupon_id: CouponId,

    #[serde(default)]
    pub barcode: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_id: Option<PartnerId>,

    /// Reward identifier codes of the lines that claimed this coupon
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub line_codes: Vec<String>,
}

/// Arguments of `confirm_coupon_programs`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfirmCouponsRequest {
    pub server_order_ids: Vec<OrderId>,
    pub coupon_data: BTreeMap<CouponId, CouponDataEntry>,
}

/// Authoritative state of a coupon after confirmation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponUpdate {
    /// Identifier the terminal used, possibly temporary
    pub old_id: CouponId,

    /// Server identifier
    pub id: CouponId,

    pub program_id: ProgramId,

    #[serde(default)]
    pub partner_id: Option<PartnerId>,

    #[serde(default)]
    pub code: Option<String>,

    pub points: Decimal,
}

/// New usage counter of a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgramUpdate {
    pub program_id: ProgramId,
    pub usages: u64,
}

/// Result of `confirm_coupon_programs`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConfirmationResponse {
    #[serde(default)]
    pub coupon_updates: Vec<CouponUpdate>,

    #[serde(default)]
    pub program_updates: Vec<ProgramUpdate>,

    #[serde(default)]
    pub coupon_report: CouponReport,

    #[serde(default)]
    pub new_coupon_info: Option<Value>,
}

/// Report action ids with the record ids to print
///
/// Reports are downloaded in the order the server lists them, so the JSON
/// object is read into a list rather than a sorted map.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CouponReport(Vec<(String, Vec<i64>)>);

impl CouponReport {
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[i64])> {
        self.0
            .iter()
            .map(|(action_id, record_ids)| (action_id.as_str(), record_ids.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Vec<i64>)> for CouponReport {
    fn from_iter<I: IntoIterator<Item = (String, Vec<i64>)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Serialize for CouponReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().map(|(action_id, record_ids)| (action_id, record_ids)))
    }
}

impl<'de> Deserialize<'de> for CouponReport {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ReportVisitor;

        impl<'de> Visitor<'de> for ReportVisitor {
            type Value = CouponReport;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of report action ids to record ids")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut reports = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((action_id, record_ids)) = map.next_entry::<String, Vec<i64>>()? {
                    reports.push((action_id, record_ids));
                }
                Ok(CouponReport(reports))
            }
        }

        deserializer.deserialize_map(ReportVisitor)
    }
}

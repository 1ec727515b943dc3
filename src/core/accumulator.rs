//! Point-change accumulation
//!
//! Collapses an order's recorded point changes and reward lines into the net
//! delta per existing coupon, plus the activation codes typed for coupons that
//! do not exist yet. This is what the pre-check sends to the server.

use crate::types::{CouponId, Order};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Pending coupon activity of one order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PendingChanges {
    /// Net signed delta per server-known coupon
    pub point_changes: BTreeMap<CouponId, Decimal>,

    /// Codes of coupons to be created, each listed once
    pub new_codes: Vec<String>,
}

impl PendingChanges {
    /// Whether there is nothing to ask the server about
    pub fn is_empty(&self) -> bool {
        self.point_changes.is_empty() && self.new_codes.is_empty()
    }
}

/// Compute the pending changes of an order
///
/// Entries on server-known coupons (`coupon_id > 0`) give the base delta.
/// Other entries only register their barcode as a new code, unless they top
/// up a gift card. Every reward line drawing from a server-known coupon then
/// subtracts its points cost.
///
/// New codes are listed once each, in ascending coupon id of the entries that
/// carry them.
pub fn accumulate(order: &Order) -> PendingChanges {
    let mut pending = PendingChanges::default();

    for entry in order.coupon_point_changes.values() {
        if entry.coupon_id > 0 {
            pending.point_changes.insert(entry.coupon_id, entry.points);
        } else if let Some(code) = entry.barcode.as_deref().filter(|code| !code.is_empty()) {
            if entry.gift_card_id.is_none() && !pending.new_codes.iter().any(|c| c == code) {
                pending.new_codes.push(code.to_string());
            }
        }
    }

    for line in order.reward_lines.iter().filter(|line| line.coupon_id > 0) {
        *pending
            .point_changes
            .entry(line.coupon_id)
            .or_insert(Decimal::ZERO) -= line.points_cost;
    }

    pending
}

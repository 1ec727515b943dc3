//! Order-related types for the loyalty synchronization engine
//!
//! An order carries the point changes recorded while it was rung up and the
//! reward lines claimed against coupons. Both are transient: they only live
//! until the order has been validated and reconciled.

use super::coupon::{CouponId, CouponRecord, OrderId, PartnerId, ProductId, ProgramId, RewardId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Pending change of points on a coupon, recorded during checkout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointChangeEntry {
    /// Coupon the points apply to (temporary or server id)
    pub coupon_id: CouponId,

    /// Signed points delta
    pub points: Decimal,

    /// Activation code typed or scanned by the cashier
    #[serde(default)]
    pub barcode: Option<String>,

    pub program_id: ProgramId,

    /// Set when the entry tops up a gift card
    #[serde(default)]
    pub gift_card_id: Option<i64>,
}

/// Order line redeeming a reward against a coupon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardLine {
    pub reward_id: RewardId,

    /// Coupon the points are drawn from
    pub coupon_id: CouponId,

    /// Positive points cost of the reward
    pub points_cost: Decimal,

    /// Identifies one claim of a reward; several lines can share it
    pub reward_identifier_code: String,

    /// Product given away by product rewards
    #[serde(default)]
    pub reward_product_id: Option<ProductId>,

    #[serde(default = "default_quantity")]
    pub quantity: Decimal,

    /// Unit price including taxes, negative for discounts
    #[serde(default)]
    pub price_incl_tax: Decimal,
}

/// Regular product line of an order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductLine {
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub price_incl_tax: Decimal,
}

fn default_quantity() -> Decimal {
    Decimal::ONE
}

/// The order being validated at the terminal
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Order {
    /// Terminal-side unique reference
    pub uid: String,

    #[serde(default)]
    pub partner_id: Option<PartnerId>,

    #[serde(default)]
    pub product_lines: Vec<ProductLine>,

    #[serde(default)]
    pub reward_lines: Vec<RewardLine>,

    /// Point changes keyed by coupon id
    #[serde(default)]
    pub coupon_point_changes: BTreeMap<CouponId, PointChangeEntry>,

    /// Coupons the cashier activated by typing or scanning their code
    #[serde(default)]
    pub code_activated_coupons: Vec<CouponRecord>,

    #[serde(default)]
    pub amount_paid: Decimal,

    /// Opaque coupon information returned by the server, used on the receipt
    #[serde(default)]
    pub new_coupon_info: Option<Value>,

    /// Identifiers assigned by the server once the order is committed
    #[serde(default)]
    pub server_ids: Vec<OrderId>,

    #[serde(default)]
    pub finalized: bool,
}

impl Order {
    /// Create an empty order
    pub fn new(uid: impl Into<String>) -> Self {
        Order {
            uid: uid.into(),
            ..Default::default()
        }
    }

    /// Whether the order has neither product nor reward lines
    pub fn is_empty(&self) -> bool {
        self.product_lines.is_empty() && self.reward_lines.is_empty()
    }

    /// Total amount due, reward lines included
    pub fn total(&self) -> Decimal {
        let products: Decimal = self
            .product_lines
            .iter()
            .map(|line| line.quantity * line.price_incl_tax)
            .sum();
        let rewards: Decimal = self
            .reward_lines
            .iter()
            .map(|line| line.quantity * line.price_incl_tax)
            .sum();
        products + rewards
    }

    /// Whether the payments cover the total
    pub fn is_paid(&self) -> bool {
        self.amount_paid >= self.total()
    }

    /// Record a point change, replacing any previous change on the same coupon
    pub fn record_point_change(&mut self, entry: PointChangeEntry) {
        self.coupon_point_changes.insert(entry.coupon_id, entry);
    }
}

//! Coupon-related types for the loyalty synchronization engine
//!
//! This module defines the identifiers shared across the crate and the
//! `CouponRecord` held by the session's coupon cache.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Coupon identifier
///
/// Positive values are server-assigned. Zero and negative values are temporary
/// identifiers handed out by the terminal for coupons created during checkout.
pub type CouponId = i64;

/// Loyalty program identifier
pub type ProgramId = i64;

/// Customer (partner) identifier
pub type PartnerId = i64;

/// Server-side order identifier
pub type OrderId = i64;

/// Reward template identifier
pub type RewardId = i64;

/// Product identifier
pub type ProductId = i64;

/// A loyalty card, coupon or gift card as known by the terminal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponRecord {
    /// Temporary (<= 0) or server-assigned (> 0) identifier
    pub id: CouponId,

    /// Code printed on the coupon, absent for cards not yet issued
    #[serde(default)]
    pub code: Option<String>,

    /// Program this coupon belongs to
    pub program_id: ProgramId,

    /// Customer owning the coupon, if nominative
    #[serde(default)]
    pub partner_id: Option<PartnerId>,

    /// Current points balance
    pub balance: Decimal,
}

impl CouponRecord {
    /// Create a new coupon record
    pub fn new(
        id: CouponId,
        code: Option<String>,
        program_id: ProgramId,
        partner_id: Option<PartnerId>,
        balance: Decimal,
    ) -> Self {
        CouponRecord {
            id,
            code,
            program_id,
            partner_id,
            balance,
        }
    }

    /// Whether the coupon still carries a terminal-assigned identifier
    pub fn is_temporary(&self) -> bool {
        self.id <= 0
    }
}

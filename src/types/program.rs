//! Loyalty program reference data
//!
//! Programs and rewards are read-mostly: they are loaded with the session and
//! only the usage counter of a program is updated by reconciliation.

use super::coupon::{ProductId, ProgramId, RewardId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// When the points of a program can be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppliesOn {
    /// Points only exist for the order being rung up
    Current,

    /// Points are issued for a later order
    Future,

    /// Points can be used now and are kept afterwards
    Both,
}

/// How an earn rule grants points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointMode {
    /// A fixed amount per order
    Order,

    /// An amount per currency unit spent
    Money,

    /// An amount per unit of product bought
    Unit,
}

/// Rule describing how points are earned within a program
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EarnRule {
    pub mode: PointMode,

    /// Points granted per order, per currency unit or per product unit
    pub reward_point_amount: Decimal,

    /// Whether the rule matches every product
    #[serde(default)]
    pub any_product: bool,

    /// Products matched by the rule when `any_product` is false
    #[serde(default)]
    pub product_ids: Vec<ProductId>,
}

impl EarnRule {
    /// Whether the rule applies to the given product
    pub fn matches_product(&self, product_id: Option<ProductId>) -> bool {
        self.any_product || product_id.is_some_and(|id| self.product_ids.contains(&id))
    }
}

/// Loyalty program configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Program {
    pub id: ProgramId,

    pub applies_on: AppliesOn,

    /// Coupons of nominative programs are bound to the order's customer
    #[serde(default)]
    pub is_nominative: bool,

    /// Number of orders that used this program, as last reported by the server
    #[serde(default)]
    pub total_order_count: u64,

    #[serde(default)]
    pub rules: Vec<EarnRule>,
}

/// Kind of reward a template grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardKind {
    /// A free product
    Product,

    /// A discount on the order or some lines
    Discount,
}

/// Reward template, claimed through reward lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reward {
    pub id: RewardId,
    pub program_id: ProgramId,
    pub kind: RewardKind,
}

//! Types module
//!
//! Contains core data structures used throughout the crate:
//! - `coupon`: coupon records and identifiers
//! - `program`: loyalty programs, earn rules and rewards
//! - `order`: the order under validation, its point changes and reward lines
//! - `rpc`: request and response shapes of the coupon RPC methods
//! - `error`: error types for the engine

pub mod coupon;
pub mod error;
pub mod order;
pub mod program;
pub mod rpc;

pub use coupon::{CouponId, CouponRecord, OrderId, PartnerId, ProductId, ProgramId, RewardId};
pub use error::LoyaltyError;
pub use order::{Order, PointChangeEntry, ProductLine, RewardLine};
pub use program::{AppliesOn, EarnRule, PointMode, Program, Reward, RewardKind};
pub use rpc::{
    ConfirmCouponsRequest, ConfirmationResponse, CouponDataEntry, CouponReport, CouponUpdate,
    ProgramUpdate,
    ValidateCouponsRequest, ValidationPayload, ValidationResponse,
};

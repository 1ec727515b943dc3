//! Core business logic module
//!
//! This module contains the coupon synchronization components:
//! - `traits` - Interfaces of the coupon store, the server and the host collaborators
//! - `coupon_cache` - Session-scoped coupon storage
//! - `program_table` - Programs, rewards and points correction
//! - `accumulator` - Net point deltas and new codes of an order
//! - `pre_check` - Advisory validation before the commit
//! - `reconciliation` - Authoritative confirmation after the commit
//! - `session` - Loyalty state of a terminal session
//! - `checkout` - Order validation with extension points
//! - `loyalty_hook` - The loyalty extension of the checkout flow

pub mod accumulator;
pub mod checkout;
pub mod coupon_cache;
pub mod loyalty_hook;
pub mod pre_check;
pub mod program_table;
pub mod reconciliation;
pub mod session;
pub mod traits;

pub use accumulator::{accumulate, PendingChanges};
pub use checkout::{
    CheckoutContext, CheckoutFlow, CheckoutHook, HookVerdict, Services, ValidationOutcome,
};
pub use coupon_cache::CouponCache;
pub use loyalty_hook::LoyaltyHook;
pub use pre_check::{run_pre_check, PreCheckOutcome};
pub use program_table::ProgramTable;
pub use reconciliation::{build_coupon_data, reconcile, ReconciliationSummary};
pub use session::PosSession;

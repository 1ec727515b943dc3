//! POS Loyalty Sync Library
//! # Overview
//!
//! This library keeps the coupon state of a point-of-sale terminal in line
//! with the loyalty server while orders are validated.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (CouponRecord, Order, RPC payloads, errors)
//! - [`config`] - RPC timeout and snapshot batch size
//! - [`core`] - Business logic components:
//!   - [`core::accumulator`] - Net point deltas and new codes of an order
//!   - [`core::pre_check`] - Advisory validation before the commit
//!   - [`core::reconciliation`] - Authoritative confirmation after the commit
//!   - [`core::checkout`] - Order validation with extension points
//!   - [`core::loyalty_hook`] - Loyalty extension of the checkout flow
//! - [`io`] - Coupon snapshot CSV reading and writing
//! - [`loader`] - Sync and async snapshot loading strategies
//! - [`replay`] - Scenario replay against a scripted server
//! - [`cli`] - CLI arguments parsing
//!
//! # Two-Phase Coupon Synchronization
//!
//! - **Pre-check**: before the commit, the net point deltas of existing coupons
//!   and the codes of new ones are sent to `validate_coupon_programs`. The
//!   answer may correct balances, drop coupons or reject the order, but never
//!   changes a coupon id. Transport failures are ignored.
//! - **Reconciliation**: once the order is stored, its final coupon usage is
//!   sent to `confirm_coupon_programs`. The answer is authoritative and is the
//!   only place where a temporary coupon id (`<= 0`) becomes a server id.
//!
//! # Coupon State
//!
//! Each cached coupon holds:
//! - `id`: server id, or a temporary id `<= 0` until confirmed
//! - `code`: activation code, if any
//! - `program_id`: the program it belongs to
//! - `partner_id`: the customer it is bound to, if any
//! - `balance`: points available

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod loader;
pub mod replay;
pub mod types;

pub use config::SyncConfig;
pub use core::{CheckoutFlow, CouponCache, LoyaltyHook, PosSession, ProgramTable};
pub use io::write_coupons_csv;
pub use types::{
    CouponId, CouponRecord, LoyaltyError, Order, PointChangeEntry, Program, Reward, RewardLine,
};

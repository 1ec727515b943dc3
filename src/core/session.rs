//! Terminal session state
//!
//! This module provides the `PosSession` struct, which owns everything the
//! terminal knows about loyalty: the coupon cache and the program table.
//!
//! # Design
//!
//! The session is plain data. The checkout flow wraps it in a mutex and hands
//! `&mut PosSession` to its hooks, so there is exactly one writer at a time and
//! an order's pre-check and reconciliation see a consistent cache.

use crate::core::coupon_cache::CouponCache;
use crate::core::program_table::ProgramTable;

/// Loyalty state of one terminal session
#[derive(Debug, Default, Clone)]
pub struct PosSession {
    /// Coupons known by the terminal, keyed by id
    pub coupons: CouponCache,

    /// Programs and rewards loaded with the session
    pub programs: ProgramTable,
}

impl PosSession {
    /// Create a session from loaded state
    ///
    /// # Arguments
    ///
    /// * `coupons` - Coupon snapshot, typically read by a snapshot loader
    /// * `programs` - Programs and rewards of the session
    pub fn new(coupons: CouponCache, programs: ProgramTable) -> Self {
        PosSession { coupons, programs }
    }
}

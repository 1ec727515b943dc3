//! Coupon cache module
//!
//! This module provides the `CouponCache` struct, the session-scoped store of
//! every coupon the terminal knows about.
//!
//! The cache is responsible for:
//! - Looking up coupons by temporary or server id
//! - Applying balance corrections and removals reported by the server
//! - Promoting temporary ids to server ids during reconciliation
//! - Providing sorted coupon listings for output

use crate::core::traits::CouponStore;
use crate::types::{CouponId, CouponRecord};
use std::collections::HashMap;

/// In-memory map of coupon ids to coupon records
#[derive(Debug, Default, Clone)]
pub struct CouponCache {
    coupons: HashMap<CouponId, CouponRecord>,
}

impl CouponCache {
    /// Create an empty cache
    pub fn new() -> Self {
        CouponCache {
            coupons: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// Get all coupons sorted by id
    ///
    /// Sorting gives deterministic output for CSV generation.
    pub fn get_all_coupons(&self) -> Vec<&CouponRecord> {
        let mut coupons: Vec<&CouponRecord> = self.coupons.values().collect();
        coupons.sort_by_key(|coupon| coupon.id);
        coupons
    }
}

impl FromIterator<CouponRecord> for CouponCache {
    fn from_iter<I: IntoIterator<Item = CouponRecord>>(iter: I) -> Self {
        let mut cache = CouponCache::new();
        for coupon in iter {
            cache.insert(coupon);
        }
        cache
    }
}

impl CouponStore for CouponCache {
    fn get(&self, id: CouponId) -> Option<&CouponRecord> {
        self.coupons.get(&id)
    }

    fn get_mut(&mut self, id: CouponId) -> Option<&mut CouponRecord> {
        self.coupons.get_mut(&id)
    }

    fn insert(&mut self, coupon: CouponRecord) -> Option<CouponRecord> {
        self.coupons.insert(coupon.id, coupon)
    }

    fn remove(&mut self, id: CouponId) -> Option<CouponRecord> {
        self.coupons.remove(&id)
    }

    fn remap_key(&mut self, old_id: CouponId, new_id: CouponId) -> bool {
        let Some(mut coupon) = self.coupons.remove(&old_id) else {
            return false;
        };
        coupon.id = new_id;
        self.coupons.insert(new_id, coupon);
        true
    }
}

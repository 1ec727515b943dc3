//! Blocking snapshot loader
//!
//! Streams the snapshot through [`SyncReader`] one row at a time. The file is
//! read on the calling task, which suits the small snapshots of a terminal.

use crate::core::coupon_cache::CouponCache;
use crate::io::sync_reader::SyncReader;
use crate::loader::{store_coupon, SnapshotLoader};
use crate::types::LoyaltyError;
use async_trait::async_trait;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy)]
pub struct SyncSnapshotLoader;

#[async_trait]
impl SnapshotLoader for SyncSnapshotLoader {
    async fn load(&self, path: &Path) -> Result<CouponCache, LoyaltyError> {
        let reader = SyncReader::new(path)?;
        let mut cache = CouponCache::new();

        for result in reader {
            match result {
                Ok(coupon) => store_coupon(&mut cache, coupon),
                Err(error) => warn!(%error, "Skipping coupon row"),
            }
        }

        debug!(coupons = cache.len(), path = %path.display(), "Snapshot loaded");
        Ok(cache)
    }
}

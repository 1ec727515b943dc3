//! Snapshot loading strategies
//!
//! A coupon snapshot can be read with the blocking csv reader or with the
//! batched csv-async reader. Both fill a [`CouponCache`] the same way, so the
//! strategy is a runtime choice.
//!
//! Rows that fail to parse are logged and skipped. When an id appears twice the
//! last row wins.

use crate::cli::LoaderType;
use crate::config::SyncConfig;
use crate::core::coupon_cache::CouponCache;
use crate::core::traits::CouponStore;
use crate::types::{CouponRecord, LoyaltyError};
use async_trait::async_trait;
use std::path::Path;
use tracing::warn;

pub mod r#async;
pub mod sync;

pub use self::r#async::AsyncSnapshotLoader;
pub use sync::SyncSnapshotLoader;

/// Loads a coupon snapshot file into a cache
#[async_trait]
pub trait SnapshotLoader: Send + Sync {
    /// Read every valid coupon of the file at `path`
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened. Invalid rows are skipped.
    async fn load(&self, path: &Path) -> Result<CouponCache, LoyaltyError>;
}

/// Create a snapshot loader
///
/// # Arguments
///
/// * `loader_type` - Blocking or batched asynchronous reading
/// * `config` - Provides the batch size of the asynchronous loader
pub fn create_loader(loader_type: LoaderType, config: &SyncConfig) -> Box<dyn SnapshotLoader> {
    match loader_type {
        LoaderType::Sync => Box::new(SyncSnapshotLoader),
        LoaderType::Async => Box::new(AsyncSnapshotLoader::new(config.batch_size)),
    }
}

/// Insert a loaded coupon, warning when it replaces an earlier row
fn store_coupon(cache: &mut CouponCache, coupon: CouponRecord) {
    let id = coupon.id;
    if cache.insert(coupon).is_some() {
        warn!(coupon_id = id, "Duplicate coupon id in snapshot, keeping the last row");
    }
}

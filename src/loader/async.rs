//! Batched asynchronous snapshot loader
//!
//! # Architecture
//!
//! ```text
//! AsyncSnapshotLoader
//!     ├── tokio::fs::File + compat layer
//!     ├── AsyncReader (csv-async, batches of batch_size rows)
//!     └── CouponCache (filled batch by batch)
//! ```

use crate::core::coupon_cache::CouponCache;
use crate::io::async_reader::AsyncReader;
use crate::loader::{store_coupon, SnapshotLoader};
use crate::types::LoyaltyError;
use async_trait::async_trait;
use std::path::Path;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct AsyncSnapshotLoader {
    /// Rows read per batch
    batch_size: usize,
}

impl AsyncSnapshotLoader {
    pub fn new(batch_size: usize) -> Self {
        Self { batch_size }
    }
}

#[async_trait]
impl SnapshotLoader for AsyncSnapshotLoader {
    async fn load(&self, path: &Path) -> Result<CouponCache, LoyaltyError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|e| LoyaltyError::IoError {
                message: format!("Failed to open file '{}': {}", path.display(), e),
            })?;

        let mut reader = AsyncReader::new(file.compat());
        let mut cache = CouponCache::new();
        let mut batches = 0usize;

        while let Some(batch) = reader.read_batch(self.batch_size).await {
            batches += 1;
            for coupon in batch {
                store_coupon(&mut cache, coupon);
            }
        }

        debug!(coupons = cache.len(), batches, path = %path.display(), "Snapshot loaded");
        Ok(cache)
    }
}

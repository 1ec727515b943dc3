//! Runtime configuration of the synchronization engine

use std::time::Duration;
use tracing::warn;

/// Tunables shared by the checkout flow and the snapshot loaders
#[derive(Clone, Debug, PartialEq)]
pub struct SyncConfig {
    /// Upper bound on every RPC round-trip
    pub rpc_timeout: Duration,
    /// Number of coupons read per batch when loading a snapshot asynchronously
    pub batch_size: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            rpc_timeout: Duration::from_secs(10),
            batch_size: 500,
        }
    }
}

impl SyncConfig {
    /// Create a SyncConfig with custom values
    ///
    /// Zero values fall back to the defaults with a warning.
    pub fn new(rpc_timeout_ms: u64, batch_size: usize) -> Self {
        let default = Self::default();

        let rpc_timeout = if rpc_timeout_ms == 0 {
            warn!(
                default_ms = default.rpc_timeout_ms(),
                "Invalid rpc timeout (0), using default"
            );
            default.rpc_timeout
        } else {
            Duration::from_millis(rpc_timeout_ms)
        };

        let batch_size = if batch_size == 0 {
            warn!(
                default = default.batch_size,
                "Invalid batch_size (0), using default"
            );
            default.batch_size
        } else {
            batch_size
        };

        Self {
            rpc_timeout,
            batch_size,
        }
    }

    /// RPC timeout in whole milliseconds, saturating at `u64::MAX`
    pub fn rpc_timeout_ms(&self) -> u64 {
        u64::try_from(self.rpc_timeout.as_millis()).unwrap_or(u64::MAX)
    }
}

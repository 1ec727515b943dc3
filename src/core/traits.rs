//! Core traits for coupon storage, server RPC and checkout collaborators
//!
//! The engine only talks to the outside world through these interfaces. The
//! RPC transport, the order commit, dialogs, notifications and report
//! downloads are provided by the host application.

use crate::types::{
    ConfirmCouponsRequest, ConfirmationResponse, CouponId, CouponRecord, LoyaltyError, Order,
    OrderId, ValidateCouponsRequest, ValidationResponse,
};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Key-value store of the coupons known by the terminal
///
/// Records are keyed by their `id`. A single writer is expected: the checkout
/// flow only hands out mutable access while holding the session lock.
pub trait CouponStore {
    /// Get a coupon by id
    fn get(&self, id: CouponId) -> Option<&CouponRecord>;

    /// Get a mutable reference to a coupon by id
    fn get_mut(&mut self, id: CouponId) -> Option<&mut CouponRecord>;

    /// Insert a coupon under its own id, returning the record it replaced
    fn insert(&mut self, coupon: CouponRecord) -> Option<CouponRecord>;

    /// Delete a coupon, a missing id is a no-op
    fn remove(&mut self, id: CouponId) -> Option<CouponRecord>;

    /// Move the record stored under `old_id` to `new_id`, updating its id
    ///
    /// Returns false when nothing is stored under `old_id`.
    fn remap_key(&mut self, old_id: CouponId, new_id: CouponId) -> bool;

    fn contains(&self, id: CouponId) -> bool {
        self.get(id).is_some()
    }
}

/// Server methods used to validate and confirm coupon usage
#[async_trait]
pub trait LoyaltyRpc: Send + Sync {
    /// Check pending point changes and new codes before the order is committed
    async fn validate_coupon_programs(
        &self,
        request: ValidateCouponsRequest,
    ) -> Result<ValidationResponse, LoyaltyError>;

    /// Send the final coupon usage of committed orders
    async fn confirm_coupon_programs(
        &self,
        request: ConfirmCouponsRequest,
    ) -> Result<ConfirmationResponse, LoyaltyError>;
}

/// Durable storage of orders on the server
#[async_trait]
pub trait OrderBackend: Send + Sync {
    /// Commit the order and return its server ids
    async fn push_order(&self, order: &Order) -> Result<Vec<OrderId>, LoyaltyError>;
}

/// Transient messages shown to the cashier
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, duration: Duration);
}

/// Blocking error dialog
pub trait ErrorDialog: Send + Sync {
    fn show_error(&self, title: &str, body: &str);
}

/// Report generation and download
#[async_trait]
pub trait ReportDownloader: Send + Sync {
    async fn download(&self, action_id: &str, record_ids: &[i64]) -> Result<(), LoyaltyError>;
}

/// Await an RPC, turning expiry of `timeout` into `LoyaltyError::Timeout`
pub async fn with_timeout<T, F>(
    operation: &str,
    timeout: Duration,
    call: F,
) -> Result<T, LoyaltyError>
where
    F: Future<Output = Result<T, LoyaltyError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(LoyaltyError::timeout(
            operation,
            u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_with_timeout_passes_result_through() {
        let result = with_timeout("op", Duration::from_secs(1), async { Ok::<_, LoyaltyError>(3) })
            .await;
        assert_eq!(result, Ok(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_with_timeout_expires() {
        let result: Result<(), LoyaltyError> = with_timeout(
            "confirm_coupon_programs",
            Duration::from_millis(250),
            futures::future::pending(),
        )
        .await;

        assert_eq!(
            result,
            Err(LoyaltyError::timeout("confirm_coupon_programs", 250))
        );
    }
}

//! Validation pre-check
//!
//! Before an order is committed, its pending point changes and new codes are
//! sent to `validate_coupon_programs`. The answer is advisory: it may correct
//! balances and drop coupons from the cache, and it may reject the order, but
//! it never changes the identity of a coupon.
//!
//! The round-trip is best effort. When the server cannot be reached the sale
//! goes on and the post-commit reconciliation settles the coupons later.

use crate::config::SyncConfig;
use crate::core::accumulator::PendingChanges;
use crate::core::traits::{with_timeout, CouponStore, LoyaltyRpc};
use crate::types::{LoyaltyError, Order, ValidateCouponsRequest, ValidationPayload};
use tracing::{debug, info, warn};

const OPERATION: &str = "validate_coupon_programs";

/// How the pre-check ended when it did not reject the order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreCheckOutcome {
    /// No coupon activity, nothing was sent
    Skipped,
    /// The server accepted the pending changes
    Accepted,
    /// The server could not be reached; validation continues regardless
    TransportIgnored,
}

/// Run the pre-check for an order
///
/// # Errors
///
/// Returns `LoyaltyError::ValidationRejected` with the server message when the
/// server refuses the changes. Corrections carried by the refusal are applied
/// before returning. Transport failures and timeouts are logged and reported
/// as `PreCheckOutcome::TransportIgnored`.
pub async fn run_pre_check<C: CouponStore>(
    rpc: &dyn LoyaltyRpc,
    config: &SyncConfig,
    coupons: &mut C,
    order: &mut Order,
    pending: &PendingChanges,
) -> Result<PreCheckOutcome, LoyaltyError> {
    if pending.is_empty() {
        debug!(order = %order.uid, "No pending coupon changes, skipping pre-check");
        return Ok(PreCheckOutcome::Skipped);
    }

    let request = ValidateCouponsRequest {
        order_ids: Vec::new(),
        point_changes: pending.point_changes.clone(),
        new_codes: pending.new_codes.clone(),
    };

    let response = match with_timeout(
        OPERATION,
        config.rpc_timeout,
        rpc.validate_coupon_programs(request),
    )
    .await
    {
        Ok(response) => response,
        Err(error) => {
            warn!(order = %order.uid, %error, "Coupon pre-check failed, continuing validation");
            return Ok(PreCheckOutcome::TransportIgnored);
        }
    };

    apply_validation_payload(coupons, order, &response.payload);

    if !response.successful {
        let message = response.payload.message.unwrap_or_default();
        info!(order = %order.uid, %message, "Coupon pre-check rejected the order");
        return Err(LoyaltyError::ValidationRejected { message });
    }

    Ok(PreCheckOutcome::Accepted)
}

/// Apply the balance corrections and removals of a pre-check answer
///
/// Ids missing from the cache are ignored, so applying the same payload twice
/// leaves the cache as applying it once.
pub fn apply_validation_payload<C: CouponStore>(
    coupons: &mut C,
    order: &mut Order,
    payload: &ValidationPayload,
) {
    for (&coupon_id, &balance) in &payload.updated_points {
        if let Some(coupon) = coupons.get_mut(coupon_id) {
            debug!(coupon_id, %balance, "Correcting coupon balance");
            coupon.balance = balance;
        }
    }

    if payload.removed_coupons.is_empty() {
        return;
    }

    for &coupon_id in &payload.removed_coupons {
        if coupons.remove(coupon_id).is_some() {
            info!(coupon_id, "Coupon removed by the server");
        }
    }
    order
        .code_activated_coupons
        .retain(|coupon| !payload.removed_coupons.contains(&coupon.id));
}

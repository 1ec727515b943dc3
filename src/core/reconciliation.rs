//! Post-commit coupon reconciliation
//!
//! Once an order is stored server-side, its final coupon usage is sent to
//! `confirm_coupon_programs`. The answer is authoritative: it is the only
//! place where a temporary coupon id is promoted to a server id.
//!
//! # Flow
//!
//! ```text
//! Order ──build_coupon_data──▶ CouponDataEntry map ──confirm──▶ ConfirmationResponse
//!                                                                  │
//!               coupon cache ◀── coupon_updates (remap + balance) ─┤
//!              program table ◀── program_updates (usage counters) ─┤
//!          report downloader ◀── coupon_report (sequential) ───────┤
//!                      order ◀── new_coupon_info ──────────────────┘
//! ```

use crate::config::SyncConfig;
use crate::core::program_table::ProgramTable;
use crate::core::traits::{with_timeout, CouponStore, LoyaltyRpc, ReportDownloader};
use crate::types::error::format_order_ids;
use crate::types::{
    AppliesOn, ConfirmCouponsRequest, ConfirmationResponse, CouponDataEntry, CouponId,
    CouponRecord, LoyaltyError, Order,
};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

const OPERATION: &str = "confirm_coupon_programs";

/// What a reconciliation changed
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ReconciliationSummary {
    /// False when there was no coupon data and no RPC was issued
    pub confirmed: bool,
    /// Cached coupons updated in place, temporary ids promoted included
    pub coupons_updated: usize,
    /// Cached coupons whose temporary id was replaced by a server id
    pub coupons_promoted: usize,
    /// Coupons unknown to the cache and created from the server answer
    pub coupons_created: usize,
    pub programs_updated: usize,
    pub reports_downloaded: usize,
}

/// Build the coupon usage of a committed order
///
/// Point-change entries are corrected by their program's points correction and
/// bound to the customer for nominative programs. Reward lines make sure their
/// coupon has an entry, record their identifier code once and subtract their
/// cost. Coupons of programs applying to the current order only are dropped
/// unless a reward line claimed them.
///
/// # Errors
///
/// Returns an error if a point change or reward line refers to a program or
/// reward the session does not know.
pub fn build_coupon_data(
    order: &Order,
    programs: &ProgramTable,
) -> Result<BTreeMap<CouponId, CouponDataEntry>, LoyaltyError> {
    let mut coupon_data: BTreeMap<CouponId, CouponDataEntry> = BTreeMap::new();

    for change in order.coupon_point_changes.values() {
        let program = programs.require_program(change.program_id)?;
        let correction = programs.points_correction(program, order)?;

        let partner_id = if program.is_nominative {
            order.partner_id
        } else {
            None
        };

        coupon_data.insert(
            change.coupon_id,
            CouponDataEntry {
                points: change.points - correction,
                program_id: change.program_id,
                coupon_id: change.coupon_id,
                barcode: change.barcode.clone(),
                partner_id,
                line_codes: Vec::new(),
            },
        );
    }

    for line in &order.reward_lines {
        let entry = match coupon_data.entry(line.coupon_id) {
            std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
            std::collections::btree_map::Entry::Vacant(entry) => {
                let reward = programs.require_reward(line.reward_id)?;
                entry.insert(CouponDataEntry {
                    points: Decimal::ZERO,
                    program_id: reward.program_id,
                    coupon_id: line.coupon_id,
                    barcode: None,
                    partner_id: None,
                    line_codes: Vec::new(),
                })
            }
        };

        if !entry.line_codes.contains(&line.reward_identifier_code) {
            entry.line_codes.push(line.reward_identifier_code.clone());
        }
        entry.points -= line.points_cost;
    }

    let mut retained = BTreeMap::new();
    for (coupon_id, entry) in coupon_data {
        let program = programs.require_program(entry.program_id)?;
        if program.applies_on == AppliesOn::Current && entry.line_codes.is_empty() {
            debug!(coupon_id, program_id = program.id, "Dropping unclaimed current-order coupon");
            continue;
        }
        retained.insert(coupon_id, entry);
    }

    Ok(retained)
}

/// Apply the server's confirmation to the session and the order
///
/// Report downloads run one after the other; a failed download is logged and
/// does not prevent the next ones.
pub async fn apply_confirmation<C: CouponStore>(
    coupons: &mut C,
    programs: &mut ProgramTable,
    order: &mut Order,
    response: ConfirmationResponse,
    reports: &dyn ReportDownloader,
) -> ReconciliationSummary {
    let mut summary = ReconciliationSummary {
        confirmed: true,
        ..Default::default()
    };

    for update in response.coupon_updates {
        let was_temporary = coupons
            .get(update.old_id)
            .is_some_and(CouponRecord::is_temporary);

        if coupons.remap_key(update.old_id, update.id) {
            if let Some(coupon) = coupons.get_mut(update.id) {
                coupon.balance = update.points;
                coupon.code = update.code;
            }
            summary.coupons_updated += 1;
            if was_temporary {
                summary.coupons_promoted += 1;
                debug!(old_id = update.old_id, id = update.id, "Temporary coupon promoted");
            }
        } else {
            coupons.insert(CouponRecord::new(
                update.id,
                update.code,
                update.program_id,
                update.partner_id,
                update.points,
            ));
            summary.coupons_created += 1;
        }
    }

    for update in response.program_updates {
        if programs.set_usages(update.program_id, update.usages) {
            summary.programs_updated += 1;
        }
    }

    for (action_id, record_ids) in response.coupon_report.iter() {
        match reports.download(action_id, record_ids).await {
            Ok(()) => summary.reports_downloaded += 1,
            Err(error) => warn!(%action_id, %error, "Coupon report download failed"),
        }
    }

    order.new_coupon_info = response.new_coupon_info;

    summary
}

/// Reconcile the coupons of a committed order with the server
///
/// # Errors
///
/// Returns `LoyaltyError::OrderNotPersisted` when the order has no server id,
/// reference errors from [`build_coupon_data`], and transport errors or
/// timeouts of the confirmation call. On a transport error the cache is left
/// untouched.
pub async fn reconcile<C: CouponStore>(
    rpc: &dyn LoyaltyRpc,
    config: &SyncConfig,
    coupons: &mut C,
    programs: &mut ProgramTable,
    order: &mut Order,
    reports: &dyn ReportDownloader,
) -> Result<ReconciliationSummary, LoyaltyError> {
    if order.server_ids.is_empty() {
        return Err(LoyaltyError::order_not_persisted(&order.uid));
    }

    let coupon_data = build_coupon_data(order, programs)?;
    if coupon_data.is_empty() {
        debug!(order = %order.uid, "No coupon data to confirm");
        return Ok(ReconciliationSummary::default());
    }

    let request = ConfirmCouponsRequest {
        server_order_ids: order.server_ids.clone(),
        coupon_data,
    };

    let response = match with_timeout(
        OPERATION,
        config.rpc_timeout,
        rpc.confirm_coupon_programs(request.clone()),
    )
    .await
    {
        Ok(response) => response,
        Err(error) => {
            warn!(
                order = %order.uid,
                server_ids = %format_order_ids(&order.server_ids),
                coupon_data = ?request.coupon_data,
                %error,
                "Coupon confirmation failed, cached coupons are stale"
            );
            return Err(error);
        }
    };

    let summary = apply_confirmation(coupons, programs, order, response, reports).await;
    info!(
        order = %order.uid,
        updated = summary.coupons_updated,
        promoted = summary.coupons_promoted,
        created = summary.coupons_created,
        programs = summary.programs_updated,
        reports = summary.reports_downloaded,
        "Coupons reconciled"
    );

    Ok(summary)
}

//! Loyalty extension of the checkout flow
//!
//! `LoyaltyHook` plugs the two coupon phases into [`CheckoutFlow`]:
//! the advisory pre-check before the commit and the authoritative
//! reconciliation after it.
//!
//! [`CheckoutFlow`]: crate::core::checkout::CheckoutFlow

use crate::core::accumulator::accumulate;
use crate::core::checkout::{CheckoutContext, CheckoutHook, HookVerdict};
use crate::core::pre_check::run_pre_check;
use crate::core::reconciliation::reconcile;
use crate::core::traits::LoyaltyRpc;
use crate::types::LoyaltyError;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Title of the dialog shown when the server rejects the coupons of an order
pub const REJECTION_TITLE: &str = "Error validating rewards";

/// Coupon validation and reconciliation around the order commit
pub struct LoyaltyHook {
    rpc: Arc<dyn LoyaltyRpc>,
}

impl LoyaltyHook {
    pub fn new(rpc: Arc<dyn LoyaltyRpc>) -> Self {
        LoyaltyHook { rpc }
    }
}

#[async_trait]
impl CheckoutHook for LoyaltyHook {
    fn name(&self) -> &str {
        "loyalty"
    }

    async fn before_validate(
        &self,
        ctx: &mut CheckoutContext<'_>,
    ) -> Result<HookVerdict, LoyaltyError> {
        let pending = accumulate(ctx.order);

        match run_pre_check(
            self.rpc.as_ref(),
            ctx.config,
            &mut ctx.session.coupons,
            ctx.order,
            &pending,
        )
        .await
        {
            Ok(outcome) => {
                debug!(order = %ctx.order.uid, ?outcome, "Coupon pre-check done");
                Ok(HookVerdict::Proceed)
            }
            Err(LoyaltyError::ValidationRejected { message }) => Ok(HookVerdict::Abort {
                title: REJECTION_TITLE.to_string(),
                message,
            }),
            Err(error) => Err(error),
        }
    }

    async fn after_commit(&self, ctx: &mut CheckoutContext<'_>) -> Result<(), LoyaltyError> {
        let session = &mut *ctx.session;
        reconcile(
            self.rpc.as_ref(),
            ctx.config,
            &mut session.coupons,
            &mut session.programs,
            ctx.order,
            ctx.services.reports.as_ref(),
        )
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use crate::core::checkout::{CheckoutFlow, Services, ValidationOutcome};
    use crate::core::coupon_cache::CouponCache;
    use crate::core::program_table::ProgramTable;
    use crate::core::session::PosSession;
    use crate::core::traits::CouponStore;
    use crate::replay::scripted::{RecordedCall, RecordingUi, Scripted, ScriptedServer, UiEvent};
    use crate::types::{
        AppliesOn, ConfirmationResponse, CouponRecord, CouponUpdate, Order, PointChangeEntry,
        ProductLine, Program, ValidationPayload, ValidationResponse,
    };
    use rust_decimal::Decimal;

    fn session() -> PosSession {
        let coupons: CouponCache =
            [CouponRecord::new(7, Some("C7".to_string()), 1, Some(3), Decimal::new(40, 0))]
                .into_iter()
                .collect();
        let programs = ProgramTable::from_parts(
            [Program {
                id: 1,
                applies_on: AppliesOn::Future,
                is_nominative: true,
                total_order_count: 0,
                rules: vec![],
            }],
            [],
        );
        PosSession::new(coupons, programs)
    }

    fn loyalty_flow(server: &Arc<ScriptedServer>, ui: &Arc<RecordingUi>) -> CheckoutFlow {
        let mut flow = CheckoutFlow::new(
            session(),
            server.clone(),
            Services {
                notifier: ui.clone(),
                dialog: ui.clone(),
                reports: ui.clone(),
            },
            SyncConfig::default(),
        );
        flow.register_hook(Arc::new(LoyaltyHook::new(server.clone())));
        flow
    }

    fn order_earning_points(uid: &str, coupon_id: i64) -> Order {
        let mut order = Order::new(uid);
        order.partner_id = Some(3);
        order.product_lines.push(ProductLine {
            product_id: 1,
            quantity: Decimal::ONE,
            price_incl_tax: Decimal::new(2000, 2),
        });
        order.amount_paid = Decimal::new(2000, 2);
        order.record_point_change(PointChangeEntry {
            coupon_id,
            points: Decimal::new(20, 0),
            barcode: None,
            program_id: 1,
            gift_card_id: None,
        });
        order
    }

    #[tokio::test]
    async fn test_rejected_pre_check_shows_dialog_without_commit() {
        let server = Arc::new(ScriptedServer::new());
        server.script_validation(Scripted::Respond(ValidationResponse {
            successful: false,
            payload: ValidationPayload {
                message: Some("Coupon expired".to_string()),
                ..Default::default()
            },
        }));
        let ui = Arc::new(RecordingUi::new());
        let flow = loyalty_flow(&server, &ui);

        let mut order = order_earning_points("0001-001-0001", 7);
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert_eq!(
            outcome,
            ValidationOutcome::Aborted {
                title: REJECTION_TITLE.to_string(),
                message: "Coupon expired".to_string(),
            }
        );
        assert_eq!(
            ui.events(),
            vec![UiEvent::Dialog {
                title: "Error validating rewards".to_string(),
                body: "Coupon expired".to_string(),
            }]
        );
        assert!(server
            .calls()
            .iter()
            .all(|call| matches!(call, RecordedCall::Validate(_))));
        assert!(!order.finalized);
    }

    #[tokio::test]
    async fn test_full_validation_promotes_new_coupon() {
        let server = Arc::new(ScriptedServer::new());
        server.script_push_order(Scripted::Respond(vec![880]));
        server.script_confirmation(Scripted::Respond(ConfirmationResponse {
            coupon_updates: vec![CouponUpdate {
                old_id: -1,
                id: 1042,
                program_id: 1,
                partner_id: Some(3),
                code: Some("0442-aa".to_string()),
                points: Decimal::new(20, 0),
            }],
            ..Default::default()
        }));
        let ui = Arc::new(RecordingUi::new());
        let flow = loyalty_flow(&server, &ui);
        flow.session()
            .await
            .coupons
            .insert(CouponRecord::new(-1, None, 1, Some(3), Decimal::ZERO));

        let mut order = order_earning_points("0001-001-0002", -1);
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert_eq!(outcome, ValidationOutcome::Committed { server_ids: vec![880] });
        let calls = server.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0], RecordedCall::PushOrder("0001-001-0002".to_string()));
        match &calls[1] {
            RecordedCall::Confirm(request) => {
                assert_eq!(request.server_order_ids, vec![880]);
                assert_eq!(request.coupon_data[&-1].partner_id, Some(3));
            }
            other => panic!("Unexpected call {:?}", other),
        }

        let session = flow.into_session();
        assert!(!session.coupons.contains(-1));
        assert_eq!(session.coupons.get(1042).unwrap().balance, Decimal::new(20, 0));
        assert!(order.finalized);
    }

    #[tokio::test]
    async fn test_confirmation_failure_keeps_order_committed() {
        let server = Arc::new(ScriptedServer::new());
        server.script_confirmation(Scripted::Fail("502 Bad Gateway".to_string()));
        let ui = Arc::new(RecordingUi::new());
        let flow = loyalty_flow(&server, &ui);

        let mut order = order_earning_points("0001-001-0003", 7);
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert!(matches!(outcome, ValidationOutcome::Committed { .. }));
        assert!(order.finalized);
        assert!(matches!(&ui.events()[..], [UiEvent::Notification { .. }]));
        assert_eq!(
            flow.session().await.coupons.get(7).unwrap().balance,
            Decimal::new(40, 0)
        );
    }
}

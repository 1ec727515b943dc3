//! Checkout flow with extension points
//!
//! This module provides the `CheckoutFlow` struct, which validates an order at
//! the terminal and commits it to the server. Features such as loyalty plug
//! into the flow by registering a [`CheckoutHook`].
//!
//! # Design
//!
//! Hooks run in registration order. Each one may inspect and mutate the
//! session and the order before the commit (`before_validate`), and finish
//! its work once the order is stored (`after_commit`).
//!
//! # Architecture
//!
//! ```text
//! validate_order
//!     ├── lock session                  (one validation at a time)
//!     ├── order guard                   (empty / unpaid / finalized)
//!     ├── before_validate hooks         (Abort → error dialog, order stays open)
//!     ├── OrderBackend::push_order      (commit, server ids)
//!     ├── after_commit hooks            (failures notified, order stays committed)
//!     └── finalize order
//! ```

use crate::config::SyncConfig;
use crate::core::session::PosSession;
use crate::core::traits::{with_timeout, ErrorDialog, Notifier, OrderBackend, ReportDownloader};
use crate::types::{LoyaltyError, Order, OrderId};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

const PUSH_ORDER: &str = "push_order";
const FAILURE_NOTICE_DURATION: Duration = Duration::from_secs(5);

/// Collaborators provided by the host application
#[derive(Clone)]
pub struct Services {
    pub notifier: Arc<dyn Notifier>,
    pub dialog: Arc<dyn ErrorDialog>,
    pub reports: Arc<dyn ReportDownloader>,
}

/// Everything a hook may touch while an order is validated
pub struct CheckoutContext<'a> {
    pub session: &'a mut PosSession,
    pub order: &'a mut Order,
    pub config: &'a SyncConfig,
    pub services: &'a Services,
}

/// Decision of a pre-validate hook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookVerdict {
    Proceed,
    /// Stop validation and show `message` to the cashier
    Abort { title: String, message: String },
}

/// Extension point of the checkout flow
#[async_trait]
pub trait CheckoutHook: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Called before the order is committed
    ///
    /// Returning an error stops validation like an abort, without a dialog.
    async fn before_validate(
        &self,
        _ctx: &mut CheckoutContext<'_>,
    ) -> Result<HookVerdict, LoyaltyError> {
        Ok(HookVerdict::Proceed)
    }

    /// Called once the order is stored on the server
    ///
    /// An error does not undo the commit: it is logged, the cashier is
    /// notified and the next hooks still run.
    async fn after_commit(&self, _ctx: &mut CheckoutContext<'_>) -> Result<(), LoyaltyError> {
        Ok(())
    }
}

/// How a validation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    /// A hook stopped validation, the order is still open
    Aborted { title: String, message: String },
    /// The order is stored on the server and finalized
    Committed { server_ids: Vec<OrderId> },
}

/// Order validation for one terminal session
pub struct CheckoutFlow {
    /// Locked for the whole validation of an order
    session: Mutex<PosSession>,
    backend: Arc<dyn OrderBackend>,
    services: Services,
    config: SyncConfig,
    hooks: Vec<Arc<dyn CheckoutHook>>,
}

impl CheckoutFlow {
    /// Create a flow without hooks
    ///
    /// # Arguments
    ///
    /// * `session` - Loyalty state of the terminal
    /// * `backend` - Server storage the orders are committed to
    /// * `services` - Dialog, notification and report collaborators
    /// * `config` - Timeouts applied to every server call
    pub fn new(
        session: PosSession,
        backend: Arc<dyn OrderBackend>,
        services: Services,
        config: SyncConfig,
    ) -> Self {
        CheckoutFlow {
            session: Mutex::new(session),
            backend,
            services,
            config,
            hooks: Vec::new(),
        }
    }

    /// Append a hook; hooks run in registration order
    pub fn register_hook(&mut self, hook: Arc<dyn CheckoutHook>) {
        debug!(hook = hook.name(), "Registering checkout hook");
        self.hooks.push(hook);
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Lock the session, waiting for a running validation to finish
    pub async fn session(&self) -> MutexGuard<'_, PosSession> {
        self.session.lock().await
    }

    pub fn into_session(self) -> PosSession {
        self.session.into_inner()
    }

    /// Validate and commit an order
    ///
    /// # Arguments
    ///
    /// * `order` - The order to validate, updated in place
    /// * `force` - Validate even if the order is not fully paid
    ///
    /// # Returns
    ///
    /// * `Ok(ValidationOutcome::Aborted)` if a hook stopped validation
    /// * `Ok(ValidationOutcome::Committed)` once the order is stored and finalized
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The order is empty, unpaid without `force`, or already finalized
    /// - A pre-validate hook fails
    /// - The commit fails, times out or returns no server id
    pub async fn validate_order(
        &self,
        order: &mut Order,
        force: bool,
    ) -> Result<ValidationOutcome, LoyaltyError> {
        let mut session = self.session.lock().await;

        check_order(order, force)?;

        let mut ctx = CheckoutContext {
            session: &mut *session,
            order,
            config: &self.config,
            services: &self.services,
        };

        for hook in &self.hooks {
            if let HookVerdict::Abort { title, message } = hook.before_validate(&mut ctx).await? {
                info!(hook = hook.name(), order = %ctx.order.uid, %message, "Validation aborted");
                self.services.dialog.show_error(&title, &message);
                return Ok(ValidationOutcome::Aborted { title, message });
            }
        }

        let server_ids = with_timeout(
            PUSH_ORDER,
            self.config.rpc_timeout,
            self.backend.push_order(ctx.order),
        )
        .await?;
        if server_ids.is_empty() {
            return Err(LoyaltyError::missing_server_ids(&ctx.order.uid));
        }
        ctx.order.server_ids = server_ids.clone();
        info!(order = %ctx.order.uid, ?server_ids, "Order committed");

        for hook in &self.hooks {
            if let Err(error) = hook.after_commit(&mut ctx).await {
                warn!(
                    hook = hook.name(),
                    order = %ctx.order.uid,
                    %error,
                    "Post-commit step failed, order stays committed"
                );
                self.services.notifier.notify(
                    &format!("Order {} was saved but {} failed: {}", ctx.order.uid, hook.name(), error),
                    FAILURE_NOTICE_DURATION,
                );
            }
        }

        ctx.order.finalized = true;
        ctx.order.coupon_point_changes.clear();

        Ok(ValidationOutcome::Committed { server_ids })
    }
}

/// Reject orders that cannot be validated in their current state
fn check_order(order: &Order, force: bool) -> Result<(), LoyaltyError> {
    if order.finalized {
        return Err(LoyaltyError::order_already_finalized(&order.uid));
    }
    if order.is_empty() {
        return Err(LoyaltyError::empty_order(&order.uid));
    }
    if !force && !order.is_paid() {
        return Err(LoyaltyError::order_not_paid(&order.uid));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::scripted::{RecordedCall, RecordingUi, Scripted, ScriptedServer, UiEvent};
    use crate::types::{PointChangeEntry, ProductLine};
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::sync::Mutex as StdMutex;

    /// Records the phases it sees and optionally aborts or fails
    struct RecordingHook {
        name: String,
        log: Arc<StdMutex<Vec<String>>>,
        abort: bool,
        fail_after_commit: bool,
    }

    impl RecordingHook {
        fn new(name: &str, log: &Arc<StdMutex<Vec<String>>>) -> Self {
            RecordingHook {
                name: name.to_string(),
                log: Arc::clone(log),
                abort: false,
                fail_after_commit: false,
            }
        }
    }

    #[async_trait]
    impl CheckoutHook for RecordingHook {
        fn name(&self) -> &str {
            &self.name
        }

        async fn before_validate(
            &self,
            _ctx: &mut CheckoutContext<'_>,
        ) -> Result<HookVerdict, LoyaltyError> {
            self.log.lock().unwrap().push(format!("{}:before", self.name));
            if self.abort {
                return Ok(HookVerdict::Abort {
                    title: "Blocked".to_string(),
                    message: self.name.clone(),
                });
            }
            Ok(HookVerdict::Proceed)
        }

        async fn after_commit(&self, ctx: &mut CheckoutContext<'_>) -> Result<(), LoyaltyError> {
            self.log
                .lock()
                .unwrap()
                .push(format!("{}:after:{:?}", self.name, ctx.order.server_ids));
            if self.fail_after_commit {
                return Err(LoyaltyError::transport("confirm_coupon_programs", "502"));
            }
            Ok(())
        }
    }

    fn paid_order(uid: &str) -> Order {
        let mut order = Order::new(uid);
        order.product_lines.push(ProductLine {
            product_id: 1,
            quantity: Decimal::ONE,
            price_incl_tax: Decimal::new(1000, 2),
        });
        order.amount_paid = Decimal::new(1000, 2);
        order
    }

    fn flow(server: &Arc<ScriptedServer>, ui: &Arc<RecordingUi>) -> CheckoutFlow {
        CheckoutFlow::new(
            PosSession::default(),
            server.clone(),
            Services {
                notifier: ui.clone(),
                dialog: ui.clone(),
                reports: ui.clone(),
            },
            SyncConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_hooks_run_in_registration_order() {
        let server = Arc::new(ScriptedServer::new());
        let ui = Arc::new(RecordingUi::new());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut flow = flow(&server, &ui);
        flow.register_hook(Arc::new(RecordingHook::new("first", &log)));
        flow.register_hook(Arc::new(RecordingHook::new("second", &log)));

        let mut order = paid_order("0001-001-0001");
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert_eq!(outcome, ValidationOutcome::Committed { server_ids: vec![1] });
        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "first:before",
                "second:before",
                "first:after:[1]",
                "second:after:[1]"
            ]
        );
        assert!(order.finalized);
        assert_eq!(order.server_ids, vec![1]);
    }

    #[tokio::test]
    async fn test_abort_shows_dialog_and_skips_commit() {
        let server = Arc::new(ScriptedServer::new());
        let ui = Arc::new(RecordingUi::new());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut flow = flow(&server, &ui);
        let mut blocker = RecordingHook::new("blocker", &log);
        blocker.abort = true;
        flow.register_hook(Arc::new(blocker));
        flow.register_hook(Arc::new(RecordingHook::new("never", &log)));

        let mut order = paid_order("0001-001-0002");
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert_eq!(
            outcome,
            ValidationOutcome::Aborted {
                title: "Blocked".to_string(),
                message: "blocker".to_string()
            }
        );
        assert_eq!(*log.lock().unwrap(), vec!["blocker:before"]);
        assert!(server.calls().is_empty());
        assert_eq!(
            ui.events(),
            vec![UiEvent::Dialog {
                title: "Blocked".to_string(),
                body: "blocker".to_string()
            }]
        );
        assert!(!order.finalized);
    }

    #[tokio::test]
    async fn test_post_commit_failure_is_notified_and_next_hooks_run() {
        let server = Arc::new(ScriptedServer::new());
        let ui = Arc::new(RecordingUi::new());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut flow = flow(&server, &ui);
        let mut failing = RecordingHook::new("loyalty", &log);
        failing.fail_after_commit = true;
        flow.register_hook(Arc::new(failing));
        flow.register_hook(Arc::new(RecordingHook::new("receipt", &log)));

        let mut order = paid_order("0001-001-0003");
        let outcome = flow.validate_order(&mut order, false).await.unwrap();

        assert!(matches!(outcome, ValidationOutcome::Committed { .. }));
        assert!(log.lock().unwrap().contains(&"receipt:after:[1]".to_string()));
        assert!(matches!(&ui.events()[..], [UiEvent::Notification { .. }]));
        assert!(order.finalized);
    }

    #[tokio::test]
    async fn test_finalize_clears_point_changes() {
        let server = Arc::new(ScriptedServer::new());
        let ui = Arc::new(RecordingUi::new());
        let flow = flow(&server, &ui);

        let mut order = paid_order("0001-001-0004");
        order.record_point_change(PointChangeEntry {
            coupon_id: 3,
            points: Decimal::new(10, 0),
            barcode: None,
            program_id: 1,
            gift_card_id: None,
        });
        flow.validate_order(&mut order, false).await.unwrap();

        assert!(order.coupon_point_changes.is_empty());
        assert_eq!(
            server.calls(),
            vec![RecordedCall::PushOrder("0001-001-0004".to_string())]
        );
    }

    #[tokio::test]
    async fn test_commit_failure_leaves_order_open() {
        let server = Arc::new(ScriptedServer::new());
        server.script_push_order(Scripted::Fail("connection refused".to_string()));
        let ui = Arc::new(RecordingUi::new());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut flow = flow(&server, &ui);
        flow.register_hook(Arc::new(RecordingHook::new("loyalty", &log)));

        let mut order = paid_order("0001-001-0005");
        let result = flow.validate_order(&mut order, false).await;

        assert!(result.unwrap_err().is_transport());
        assert_eq!(*log.lock().unwrap(), vec!["loyalty:before"]);
        assert!(!order.finalized);
    }

    #[tokio::test]
    async fn test_commit_without_server_ids() {
        let server = Arc::new(ScriptedServer::new());
        server.script_push_order(Scripted::Respond(vec![]));
        let ui = Arc::new(RecordingUi::new());
        let flow = flow(&server, &ui);

        let mut order = paid_order("0001-001-0006");
        let result = flow.validate_order(&mut order, false).await;

        assert_eq!(result, Err(LoyaltyError::missing_server_ids("0001-001-0006")));
    }

    #[rstest]
    #[case::empty(Order::new("o1"), false, Some(LoyaltyError::empty_order("o1")))]
    #[case::unpaid({
        let mut order = paid_order("o2");
        order.amount_paid = Decimal::ZERO;
        order
    }, false, Some(LoyaltyError::order_not_paid("o2")))]
    #[case::unpaid_forced({
        let mut order = paid_order("o3");
        order.amount_paid = Decimal::ZERO;
        order
    }, true, None)]
    #[case::finalized({
        let mut order = paid_order("o4");
        order.finalized = true;
        order
    }, true, Some(LoyaltyError::order_already_finalized("o4")))]
    #[case::paid(paid_order("o5"), false, None)]
    fn test_check_order(
        #[case] order: Order,
        #[case] force: bool,
        #[case] expected: Option<LoyaltyError>,
    ) {
        assert_eq!(check_order(&order, force).err(), expected);
    }

    #[tokio::test]
    async fn test_guard_runs_before_hooks() {
        let server = Arc::new(ScriptedServer::new());
        let ui = Arc::new(RecordingUi::new());
        let log = Arc::new(StdMutex::new(Vec::new()));
        let mut flow = flow(&server, &ui);
        flow.register_hook(Arc::new(RecordingHook::new("loyalty", &log)));

        let mut order = Order::new("0001-001-0007");
        let result = flow.validate_order(&mut order, true).await;

        assert_eq!(result, Err(LoyaltyError::empty_order("0001-001-0007")));
        assert!(log.lock().unwrap().is_empty());
        assert!(server.calls().is_empty());
    }
}

//! Scenario replay
//!
//! Drives a [`CheckoutFlow`] with the loyalty hook through the steps of a
//! [`Scenario`], against a [`ScriptedServer`] and a [`RecordingUi`]. This is
//! how the engine is exercised end to end without a real backend.
//!
//! # Architecture
//!
//! ```text
//! run_scenario
//!     ├── PosSession (loaded coupons + scenario programs)
//!     ├── ScriptedServer (LoyaltyRpc + OrderBackend, answers scripted per step)
//!     ├── RecordingUi (dialogs, notifications, reports)
//!     └── CheckoutFlow + LoyaltyHook
//!             └── validate_order for every step, in order
//! ```

use crate::config::SyncConfig;
use crate::core::checkout::{CheckoutFlow, Services, ValidationOutcome};
use crate::core::coupon_cache::CouponCache;
use crate::core::loyalty_hook::LoyaltyHook;
use crate::core::program_table::ProgramTable;
use crate::core::session::PosSession;
use crate::types::{LoyaltyError, Order, OrderId};
use std::sync::Arc;
use tracing::{info, warn};

pub mod scenario;
pub mod scripted;

pub use scenario::{Scenario, ScenarioStep};
pub use scripted::{RecordedCall, RecordingUi, Scripted, ScriptedServer, UiEvent};

/// How one step ended
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    Committed { server_ids: Vec<OrderId> },
    Aborted { message: String },
    Failed { error: LoyaltyError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    /// The order as it stands after the step
    pub order: Order,
    pub result: StepResult,
}

/// Everything observed while replaying a scenario
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplaySummary {
    pub steps: Vec<StepReport>,
    pub calls: Vec<RecordedCall>,
    pub ui_events: Vec<UiEvent>,
}

impl ReplaySummary {
    pub fn committed(&self) -> usize {
        self.count(|result| matches!(result, StepResult::Committed { .. }))
    }

    pub fn aborted(&self) -> usize {
        self.count(|result| matches!(result, StepResult::Aborted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|result| matches!(result, StepResult::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&StepResult) -> bool) -> usize {
        self.steps.iter().filter(|step| predicate(&step.result)).count()
    }
}

/// Replay a scenario on top of a coupon snapshot
///
/// Steps run one after the other; a step that fails is reported and the next
/// one still runs.
///
/// # Returns
///
/// The session as left by the last step, and what happened on the way.
pub async fn run_scenario(
    coupons: CouponCache,
    scenario: Scenario,
    config: SyncConfig,
) -> Result<(PosSession, ReplaySummary), LoyaltyError> {
    let programs = ProgramTable::from_parts(scenario.programs, scenario.rewards);
    let server = Arc::new(ScriptedServer::new());
    let ui = Arc::new(RecordingUi::with_failing_reports(scenario.failing_reports));

    let mut flow = CheckoutFlow::new(
        PosSession::new(coupons, programs),
        server.clone(),
        Services {
            notifier: ui.clone(),
            dialog: ui.clone(),
            reports: ui.clone(),
        },
        config,
    );
    flow.register_hook(Arc::new(LoyaltyHook::new(server.clone())));

    let mut summary = ReplaySummary::default();
    for step in scenario.steps {
        server.clear_scripts();
        if let Some(answer) = step.validation {
            server.script_validation(answer);
        }
        if let Some(answer) = step.commit {
            server.script_push_order(answer);
        }
        if let Some(answer) = step.confirmation {
            server.script_confirmation(answer);
        }

        let mut order = step.order;
        let result = match flow.validate_order(&mut order, step.force).await {
            Ok(ValidationOutcome::Committed { server_ids }) => StepResult::Committed { server_ids },
            Ok(ValidationOutcome::Aborted { message, .. }) => StepResult::Aborted { message },
            Err(error) => {
                warn!(order = %order.uid, %error, "Order validation failed");
                StepResult::Failed { error }
            }
        };
        summary.steps.push(StepReport { order, result });
    }

    summary.calls = server.calls();
    summary.ui_events = ui.events();
    info!(
        committed = summary.committed(),
        aborted = summary.aborted(),
        failed = summary.failed(),
        "Scenario replayed"
    );

    Ok((flow.into_session(), summary))
}

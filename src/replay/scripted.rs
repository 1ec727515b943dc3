//! Scripted server and recording collaborators
//!
//! `ScriptedServer` answers the coupon RPCs and the order commit from queues
//! of scripted responses and records every call it receives. `RecordingUi`
//! stands in for the dialog, notification and report services and records
//! what they were asked to do.
//!
//! When a queue is empty the server answers like a healthy backend: the
//! pre-check accepts, the commit returns the next order id and the
//! confirmation changes nothing.

use crate::core::traits::{ErrorDialog, LoyaltyRpc, Notifier, OrderBackend, ReportDownloader};
use crate::types::{
    ConfirmCouponsRequest, ConfirmationResponse, LoyaltyError, Order, OrderId,
    ValidateCouponsRequest, ValidationResponse,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

/// One scripted answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scripted<T> {
    /// Answer with this value
    Respond(T),
    /// Fail with a transport error carrying this message
    Fail(String),
    /// Never answer
    Stall,
}

/// A call received by the scripted server
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Validate(ValidateCouponsRequest),
    /// Commit of the order with this uid
    PushOrder(String),
    Confirm(ConfirmCouponsRequest),
}

#[derive(Debug, Default)]
struct ServerState {
    validations: VecDeque<Scripted<ValidationResponse>>,
    commits: VecDeque<Scripted<Vec<OrderId>>>,
    confirmations: VecDeque<Scripted<ConfirmationResponse>>,
    calls: Vec<RecordedCall>,
    last_order_id: OrderId,
}

/// In-memory server driven by scripted responses
#[derive(Debug, Default)]
pub struct ScriptedServer {
    state: Mutex<ServerState>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ServerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn script_validation(&self, answer: Scripted<ValidationResponse>) {
        self.state().validations.push_back(answer);
    }

    pub fn script_push_order(&self, answer: Scripted<Vec<OrderId>>) {
        self.state().commits.push_back(answer);
    }

    pub fn script_confirmation(&self, answer: Scripted<ConfirmationResponse>) {
        self.state().confirmations.push_back(answer);
    }

    /// Drop the answers that were scripted but not consumed
    pub fn clear_scripts(&self) {
        let mut state = self.state();
        state.validations.clear();
        state.commits.clear();
        state.confirmations.clear();
    }

    /// Calls received so far, oldest first
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.state().calls.clone()
    }
}

/// Resolve a scripted answer; the state lock is released before stalling
async fn answer<T>(operation: &str, scripted: Scripted<T>) -> Result<T, LoyaltyError> {
    match scripted {
        Scripted::Respond(value) => Ok(value),
        Scripted::Fail(message) => Err(LoyaltyError::transport(operation, message)),
        Scripted::Stall => futures::future::pending().await,
    }
}

#[async_trait]
impl LoyaltyRpc for ScriptedServer {
    async fn validate_coupon_programs(
        &self,
        request: ValidateCouponsRequest,
    ) -> Result<ValidationResponse, LoyaltyError> {
        let scripted = {
            let mut state = self.state();
            state.calls.push(RecordedCall::Validate(request));
            state.validations.pop_front().unwrap_or_else(|| {
                Scripted::Respond(ValidationResponse {
                    successful: true,
                    payload: Default::default(),
                })
            })
        };
        answer("validate_coupon_programs", scripted).await
    }

    async fn confirm_coupon_programs(
        &self,
        request: ConfirmCouponsRequest,
    ) -> Result<ConfirmationResponse, LoyaltyError> {
        let scripted = {
            let mut state = self.state();
            state.calls.push(RecordedCall::Confirm(request));
            state
                .confirmations
                .pop_front()
                .unwrap_or_else(|| Scripted::Respond(ConfirmationResponse::default()))
        };
        answer("confirm_coupon_programs", scripted).await
    }
}

#[async_trait]
impl OrderBackend for ScriptedServer {
    async fn push_order(&self, order: &Order) -> Result<Vec<OrderId>, LoyaltyError> {
        let scripted = {
            let mut state = self.state();
            state.calls.push(RecordedCall::PushOrder(order.uid.clone()));
            let next = state.commits.pop_front();
            match next {
                Some(scripted) => scripted,
                None => {
                    state.last_order_id += 1;
                    Scripted::Respond(vec![state.last_order_id])
                }
            }
        };
        answer("push_order", scripted).await
    }
}

/// Something the host application was asked to show or do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notification { message: String, duration: Duration },
    Dialog { title: String, body: String },
    ReportDownload { action_id: String, record_ids: Vec<i64> },
}

/// Collaborators recording their calls
#[derive(Debug, Default)]
pub struct RecordingUi {
    events: Mutex<Vec<UiEvent>>,
    failing_reports: BTreeSet<String>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make downloads of these report actions fail
    pub fn with_failing_reports(failing_reports: impl IntoIterator<Item = String>) -> Self {
        RecordingUi {
            events: Mutex::new(Vec::new()),
            failing_reports: failing_reports.into_iter().collect(),
        }
    }

    pub fn events(&self) -> Vec<UiEvent> {
        self.lock_events().clone()
    }

    fn lock_events(&self) -> MutexGuard<'_, Vec<UiEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: UiEvent) {
        self.lock_events().push(event);
    }
}

impl Notifier for RecordingUi {
    fn notify(&self, message: &str, duration: Duration) {
        self.record(UiEvent::Notification {
            message: message.to_string(),
            duration,
        });
    }
}

impl ErrorDialog for RecordingUi {
    fn show_error(&self, title: &str, body: &str) {
        self.record(UiEvent::Dialog {
            title: title.to_string(),
            body: body.to_string(),
        });
    }
}

#[async_trait]
impl ReportDownloader for RecordingUi {
    async fn download(&self, action_id: &str, record_ids: &[i64]) -> Result<(), LoyaltyError> {
        if self.failing_reports.contains(action_id) {
            return Err(LoyaltyError::transport(
                "download_report",
                format!("report {} is unavailable", action_id),
            ));
        }
        self.record(UiEvent::ReportDownload {
            action_id: action_id.to_string(),
            record_ids: record_ids.to_vec(),
        });
        Ok(())
    }
}

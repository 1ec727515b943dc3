//! Error types for the loyalty synchronization engine
//!
//! This module defines every error that can occur while validating an order,
//! reconciling coupons or loading snapshots and scenarios.
//!
//! # Error Categories
//!
//! - **Server Errors**: the pre-check rejected the pending changes
//! - **Transport Errors**: an RPC failed or timed out
//! - **Reference Errors**: a program or reward is missing from the session
//! - **Order Errors**: the order cannot be validated in its current state
//! - **I/O Errors**: snapshot or scenario files could not be read or parsed

use crate::types::{OrderId, ProgramId, RewardId};
use thiserror::Error;

/// Main error type for the loyalty engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LoyaltyError {
    /// The server refused the pending point changes or new codes
    ///
    /// Recoverable: the order stays open so the cashier can fix it.
    #[error("Coupon validation rejected: {message}")]
    ValidationRejected {
        /// Message to show to the cashier
        message: String,
    },

    /// An RPC could not be completed
    #[error("Transport failure during {operation}: {message}")]
    Transport {
        /// RPC method name
        operation: String,
        message: String,
    },

    /// An RPC did not answer in time
    #[error("{operation} timed out after {millis}ms")]
    Timeout {
        /// RPC method name
        operation: String,
        millis: u64,
    },

    /// A point change or coupon refers to a program the session does not know
    #[error("Unknown loyalty program {program_id}")]
    UnknownProgram { program_id: ProgramId },

    /// A reward line refers to a reward the session does not know
    #[error("Unknown reward {reward_id}")]
    UnknownReward { reward_id: RewardId },

    /// Reconciliation needs the server ids of a committed order
    #[error("Order {uid} has not been persisted on the server")]
    OrderNotPersisted { uid: String },

    #[error("Order {uid} has no lines")]
    EmptyOrder { uid: String },

    #[error("Order {uid} is not fully paid")]
    OrderNotPaid { uid: String },

    #[error("Order {uid} has already been validated")]
    OrderAlreadyFinalized { uid: String },

    /// The commit RPC answered without any order id
    #[error("Server returned no id for order {uid}")]
    MissingServerIds { uid: String },

    #[error("I/O error: {message}")]
    IoError { message: String },

    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        message: String,
    },

    /// A replay scenario is malformed or inconsistent
    #[error("Scenario error: {message}")]
    ScenarioError { message: String },
}

impl From<std::io::Error> for LoyaltyError {
    fn from(error: std::io::Error) -> Self {
        LoyaltyError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for LoyaltyError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        LoyaltyError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for LoyaltyError {
    fn from(error: serde_json::Error) -> Self {
        LoyaltyError::ScenarioError {
            message: error.to_string(),
        }
    }
}

impl LoyaltyError {
    /// Create a ValidationRejected error
    pub fn validation_rejected(message: &str) -> Self {
        LoyaltyError::ValidationRejected {
            message: message.to_string(),
        }
    }

    /// Create a Transport error
    pub fn transport(operation: &str, message: impl Into<String>) -> Self {
        LoyaltyError::Transport {
            operation: operation.to_string(),
            message: message.into(),
        }
    }

    /// Create a Timeout error
    pub fn timeout(operation: &str, millis: u64) -> Self {
        LoyaltyError::Timeout {
            operation: operation.to_string(),
            millis,
        }
    }

    pub fn unknown_program(program_id: ProgramId) -> Self {
        LoyaltyError::UnknownProgram { program_id }
    }

    pub fn unknown_reward(reward_id: RewardId) -> Self {
        LoyaltyError::UnknownReward { reward_id }
    }

    pub fn order_not_persisted(uid: &str) -> Self {
        LoyaltyError::OrderNotPersisted {
            uid: uid.to_string(),
        }
    }

    pub fn empty_order(uid: &str) -> Self {
        LoyaltyError::EmptyOrder {
            uid: uid.to_string(),
        }
    }

    pub fn order_not_paid(uid: &str) -> Self {
        LoyaltyError::OrderNotPaid {
            uid: uid.to_string(),
        }
    }

    pub fn order_already_finalized(uid: &str) -> Self {
        LoyaltyError::OrderAlreadyFinalized {
            uid: uid.to_string(),
        }
    }

    pub fn missing_server_ids(uid: &str) -> Self {
        LoyaltyError::MissingServerIds {
            uid: uid.to_string(),
        }
    }

    pub fn scenario(message: impl Into<String>) -> Self {
        LoyaltyError::ScenarioError {
            message: message.into(),
        }
    }

    /// Whether the error comes from the network rather than from the server's verdict
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            LoyaltyError::Transport { .. } | LoyaltyError::Timeout { .. }
        )
    }
}

/// Server ids are logged with errors about committed orders
pub(crate) fn format_order_ids(ids: &[OrderId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

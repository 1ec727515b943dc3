//! Replay scenarios
//!
//! A scenario is a JSON document describing the programs of a session and a
//! sequence of orders to validate, each with the server answers to script:
//!
//! ```json
//! {
//!   "programs": [{ "id": 1, "applies_on": "future" }],
//!   "rewards": [{ "id": 10, "program_id": 1, "kind": "discount" }],
//!   "failing_reports": [],
//!   "steps": [{
//!     "order": { "uid": "0001-001-0001", "product_lines": [...], "amount_paid": 20 },
//!     "force": false,
//!     "validation": { "respond": { "successful": true } },
//!     "commit": { "respond": [501] },
//!     "confirmation": { "fail": "502 Bad Gateway" }
//!   }]
//! }
//! ```
//!
//! Omitted answers fall back to the scripted server's healthy defaults.

use crate::replay::scripted::Scripted;
use crate::types::{
    ConfirmationResponse, LoyaltyError, Order, OrderId, Program, Reward, ValidationResponse,
};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub programs: Vec<Program>,

    #[serde(default)]
    pub rewards: Vec<Reward>,

    /// Report actions whose download fails
    #[serde(default)]
    pub failing_reports: Vec<String>,

    pub steps: Vec<ScenarioStep>,
}

/// One order validation and the answers scripted for it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScenarioStep {
    pub order: Order,

    /// Validate even if the order is not fully paid
    #[serde(default)]
    pub force: bool,

    #[serde(default)]
    pub validation: Option<Scripted<ValidationResponse>>,

    #[serde(default)]
    pub commit: Option<Scripted<Vec<OrderId>>>,

    #[serde(default)]
    pub confirmation: Option<Scripted<ConfirmationResponse>>,
}

impl Scenario {
    /// Parse and check a scenario
    ///
    /// # Errors
    ///
    /// Returns `LoyaltyError::ScenarioError` if the JSON is malformed, or if
    /// two steps share an order uid or a reward refers to an unknown program.
    pub fn from_json(json: &str) -> Result<Self, LoyaltyError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.check()?;
        Ok(scenario)
    }

    /// Read a scenario file
    pub async fn from_file(path: &Path) -> Result<Self, LoyaltyError> {
        let json = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| LoyaltyError::IoError {
                message: format!("Failed to read scenario '{}': {}", path.display(), e),
            })?;
        Self::from_json(&json)
    }

    fn check(&self) -> Result<(), LoyaltyError> {
        let mut uids = HashSet::new();
        for step in &self.steps {
            if !uids.insert(step.order.uid.as_str()) {
                return Err(LoyaltyError::scenario(format!(
                    "order {} appears in more than one step",
                    step.order.uid
                )));
            }

            if let Some((key, entry)) = step
                .order
                .coupon_point_changes
                .iter()
                .find(|(key, entry)| **key != entry.coupon_id)
            {
                return Err(LoyaltyError::scenario(format!(
                    "order {} records a point change under {} for coupon {}",
                    step.order.uid, key, entry.coupon_id
                )));
            }
        }

        let program_ids: HashSet<_> = self.programs.iter().map(|p| p.id).collect();
        if let Some(reward) = self
            .rewards
            .iter()
            .find(|reward| !program_ids.contains(&reward.program_id))
        {
            return Err(LoyaltyError::scenario(format!(
                "reward {} refers to unknown program {}",
                reward.id, reward.program_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;

    #[test]
    fn test_minimal_scenario() {
        let scenario = Scenario::from_json(
            r#"{"steps": [{"order": {"uid": "o1", "amount_paid": "12.50"}}]}"#,
        )
        .unwrap();

        let step = &scenario.steps[0];
        assert_eq!(step.order.uid, "o1");
        assert_eq!(step.order.amount_paid, Decimal::new(1250, 2));
        assert!(!step.force);
        assert_eq!(step.validation, None);
        assert_eq!(step.commit, None);
    }

    #[test]
    fn test_scripted_answers() {
        let scenario = Scenario::from_json(
            r#"{
                "programs": [{"id": 1, "applies_on": "current"}],
                "rewards": [{"id": 10, "program_id": 1, "kind": "product"}],
                "steps": [{
                    "order": {"uid": "o1"},
                    "validation": {"respond": {"successful": false, "payload": {"message": "Coupon expired"}}},
                    "commit": "stall",
                    "confirmation": {"fail": "502"}
                }]
            }"#,
        )
        .unwrap();

        let step = &scenario.steps[0];
        assert!(matches!(
            &step.validation,
            Some(Scripted::Respond(response)) if !response.successful
        ));
        assert_eq!(step.commit, Some(Scripted::Stall));
        assert_eq!(step.confirmation, Some(Scripted::Fail("502".to_string())));
    }

    #[rstest]
    #[case::malformed(r#"{"steps": [}"#, "Scenario error")]
    #[case::missing_steps(r#"{"programs": []}"#, "missing field `steps`")]
    #[case::duplicate_uid(
        r#"{"steps": [{"order": {"uid": "o1"}}, {"order": {"uid": "o1"}}]}"#,
        "order o1 appears in more than one step"
    )]
    #[case::dangling_reward(
        r#"{"rewards": [{"id": 3, "program_id": 9, "kind": "discount"}], "steps": []}"#,
        "reward 3 refers to unknown program 9"
    )]
    #[case::point_change_under_other_coupon(
        r#"{"steps": [{"order": {"uid": "o1", "coupon_point_changes": {"-1": {"coupon_id": 7, "points": 5, "program_id": 1}}}}]}"#,
        "order o1 records a point change under -1 for coupon 7"
    )]
    fn test_invalid_scenarios(#[case] json: &str, #[case] expected: &str) {
        let error = Scenario::from_json(json).unwrap_err();

        assert!(matches!(error, LoyaltyError::ScenarioError { .. }));
        assert!(
            error.to_string().contains(expected),
            "unexpected error: {}",
            error
        );
    }
}

//! Program reference table
//!
//! This module provides the `ProgramTable` component holding the loyalty
//! programs and reward templates loaded with the session. Reward lines are
//! resolved to their program through this table, and the per-program points
//! correction is computed here.
//!
//! # Points Correction
//!
//! Points earned on an order are estimated by the terminal, but reward lines
//! themselves can match earn rules (a free product bought "for" points would
//! otherwise earn points too). The correction removes that share so the
//! server receives the same figure it computes itself.

use crate::types::{
    LoyaltyError, Order, PointMode, Program, ProgramId, Reward, RewardId, RewardKind, RewardLine,
};
use rust_decimal::{Decimal, RoundingStrategy};
use std::collections::HashMap;

/// Programs and rewards known by the session
#[derive(Debug, Default, Clone)]
pub struct ProgramTable {
    programs: HashMap<ProgramId, Program>,
    rewards: HashMap<RewardId, Reward>,
}

impl ProgramTable {
    /// Create an empty table
    pub fn new() -> Self {
        ProgramTable {
            programs: HashMap::new(),
            rewards: HashMap::new(),
        }
    }

    /// Build a table from loaded programs and rewards
    pub fn from_parts(
        programs: impl IntoIterator<Item = Program>,
        rewards: impl IntoIterator<Item = Reward>,
    ) -> Self {
        ProgramTable {
            programs: programs.into_iter().map(|p| (p.id, p)).collect(),
            rewards: rewards.into_iter().map(|r| (r.id, r)).collect(),
        }
    }

    /// Get a program by id
    pub fn program(&self, program_id: ProgramId) -> Option<&Program> {
        self.programs.get(&program_id)
    }

    /// Get a program, failing when the session does not know it
    pub fn require_program(&self, program_id: ProgramId) -> Result<&Program, LoyaltyError> {
        self.program(program_id)
            .ok_or_else(|| LoyaltyError::unknown_program(program_id))
    }

    /// Get a reward, failing when the session does not know it
    pub fn require_reward(&self, reward_id: RewardId) -> Result<&Reward, LoyaltyError> {
        self.rewards
            .get(&reward_id)
            .ok_or_else(|| LoyaltyError::unknown_reward(reward_id))
    }

    /// Set the usage counter of a program
    ///
    /// Returns false when the program is unknown, in which case nothing changes.
    pub fn set_usages(&mut self, program_id: ProgramId, usages: u64) -> bool {
        match self.programs.get_mut(&program_id) {
            Some(program) => {
                program.total_order_count = usages;
                true
            }
            None => false,
        }
    }

    /// Points the terminal over-estimated for `program` because of the order's reward lines
    ///
    /// # Errors
    ///
    /// Returns an error if a reward line refers to an unknown reward.
    pub fn points_correction(&self, program: &Program, order: &Order) -> Result<Decimal, LoyaltyError> {
        let mut correction = Decimal::ZERO;

        for rule in &program.rules {
            for line in &order.reward_lines {
                let reward = self.require_reward(line.reward_id)?;
                if !valid_for_correction(reward, line, rule.matches_product(line.reward_product_id)) {
                    continue;
                }

                match rule.mode {
                    PointMode::Money => {
                        let line_total = line.price_incl_tax * line.quantity;
                        correction -= (rule.reward_point_amount * line_total)
                            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
                    }
                    PointMode::Unit => {
                        correction += rule.reward_point_amount * line.quantity;
                    }
                    PointMode::Order => {}
                }
            }
        }

        Ok(correction)
    }
}

/// Only free products can match an earn rule
fn valid_for_correction(reward: &Reward, line: &RewardLine, rule_matches: bool) -> bool {
    reward.kind == RewardKind::Product && line.reward_product_id.is_some() && rule_matches
}

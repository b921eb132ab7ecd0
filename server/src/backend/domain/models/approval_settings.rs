//! Per-parent gift approval policy.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GiftApprovalSettings {
    pub max_reward_gifts_per_year: u32,
    pub max_reward_price_cents: i64,
    pub auto_approve_christmas: bool,
    pub auto_approve_rewards: bool,
    pub auto_approve_max_points: u32,
}

impl Default for GiftApprovalSettings {
    fn default() -> Self {
        Self {
            max_reward_gifts_per_year: 4,
            max_reward_price_cents: 2_500,
            auto_approve_christmas: true,
            auto_approve_rewards: false,
            auto_approve_max_points: 10,
        }
    }
}

impl GiftApprovalSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.max_reward_price_cents < 0 {
            return Err("Maximum reward price cannot be negative".to_string());
        }
        if self.max_reward_gifts_per_year > 365 {
            return Err("Maximum reward gifts per year cannot exceed 365".to_string());
        }
        Ok(())
    }

    /// Whether a reward gift costing `cost_points` skips the parent
    pub fn auto_approves_reward(&self, cost_points: u32) -> bool {
        self.auto_approve_rewards && cost_points <= self.auto_approve_max_points
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Budgets below this are `starter`
pub const MID_TIER_FLOOR: f64 = 8000.0;
/// Budgets at or above this are `premium`
pub const PREMIUM_TIER_FLOOR: f64 = 25000.0;

/// Coarse budget classification, derived solely from the budget value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BudgetTier {
    Starter,
    Mid,
    Premium,
}

impl BudgetTier {
    /// Lower bounds are inclusive: 8000 is `mid`, 25000 is `premium`.
    pub fn from_budget(budget: f64) -> Self {
        if budget < MID_TIER_FLOOR {
            BudgetTier::Starter
        } else if budget < PREMIUM_TIER_FLOOR {
            BudgetTier::Mid
        } else {
            BudgetTier::Premium
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BudgetTier::Starter => "starter",
            BudgetTier::Mid => "mid",
            BudgetTier::Premium => "premium",
        }
    }
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

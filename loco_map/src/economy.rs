// Inflation-adjusted pricing.
//
// Each priced object names a base cost factor and one of 32 cost indices.
// The economy keeps a multiplier per index (1024 = no inflation) and prices
// are `(factor * multiplier) >> shift`, with the shift chosen by the caller
// (12 for trees, 8 for buildings and terraforming).

use crate::objects::CostFactor;
use crate::types::Currency;
use serde::{Deserialize, Serialize};

pub const COST_INDEX_COUNT: usize = 32;

/// Multiplier value meaning "no inflation yet".
pub const BASE_MULTIPLIER: u32 = 1024;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Economy {
    pub cost_multipliers: [u32; COST_INDEX_COUNT],
}

impl Default for Economy {
    fn default() -> Self {
        Self {
            cost_multipliers: [BASE_MULTIPLIER; COST_INDEX_COUNT],
        }
    }
}

impl Economy {
    pub fn inflation_adjusted_cost(&self, factor: Currency, cost_index: u8, shift: u8) -> Currency {
        let multiplier = self
            .cost_multipliers
            .get(usize::from(cost_index))
            .copied()
            .unwrap_or(BASE_MULTIPLIER);
        ((i64::from(factor) * i64::from(multiplier)) >> shift) as Currency
    }

    pub fn price(&self, cost: CostFactor, shift: u8) -> Currency {
        self.inflation_adjusted_cost(cost.factor, cost.cost_index, shift)
    }
}

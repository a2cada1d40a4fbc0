//! Beauty ladder: scalar lower bounds only, three configurable multiplicative
//! factors applied in sequence.

use crate::estimation_info::{Cost, EstimationInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeautyConfig {
    pub factor_first: Cost,
    pub factor_second: Cost,
    pub factor_third: Cost,
}

impl Default for BeautyConfig {
    fn default() -> Self {
        Self {
            factor_first: 1,
            factor_second: 3,
            factor_third: 4,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BeautyEstimator {
    min_cost: Cost,
}

impl BeautyEstimator {
    pub fn estimate(&self, info: &mut EstimationInfo) {
        info.min_cost = self.min_cost;
    }
}

/// Factory: consults `info.rank`/`info.try_next`, possibly advances the
/// ladder, and returns the estimator for the current step (or `None` once the
/// ladder is exhausted).
pub fn get_estimator(
    info: &mut EstimationInfo,
    adjusted_cost: Cost,
    cfg: &BeautyConfig,
) -> Option<BeautyEstimator> {
    if !info.try_next {
        return None;
    }
    let min_cost = match info.rank {
        0 => {
            if adjusted_cost > 0 {
                info.rank += 1;
                adjusted_cost * cfg.factor_first
            } else {
                info.try_next = false;
                adjusted_cost
            }
        }
        1 => {
            info.rank += 1;
            adjusted_cost * cfg.factor_second
        }
        2 => {
            info.rank += 1;
            adjusted_cost * cfg.factor_third
        }
        _ => {
            info.try_next = false;
            return None;
        }
    };
    Some(BeautyEstimator { min_cost })
}

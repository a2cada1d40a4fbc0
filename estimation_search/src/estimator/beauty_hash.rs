//! BeautyHash ladder: identical shape to [`super::beauty`], but the factor
//! triple is selected per edge by a small integer hash instead of a fixed
//! configuration, giving per-edge variation without randomness.

use crate::estimation_info::{Cost, EstimationInfo};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeautyHashConfig {
    pub seed: Cost,
}

impl Default for BeautyHashConfig {
    fn default() -> Self {
        Self { seed: 0 }
    }
}

const FACTOR_TABLE: [(Cost, Cost, Cost); 9] = [
    (1, 2, 3),
    (2, 3, 4),
    (3, 4, 5),
    (1, 3, 4),
    (2, 4, 5),
    (3, 5, 6),
    (1, 4, 5),
    (2, 5, 6),
    (3, 6, 7),
];

fn factors_for(adjusted_cost: Cost, seed: Cost) -> (Cost, Cost, Cost) {
    let h = (adjusted_cost + seed).rem_euclid(9) as usize;
    FACTOR_TABLE[h]
}

#[derive(Debug, Clone, Copy)]
pub struct BeautyHashEstimator {
    min_cost: Cost,
}

impl BeautyHashEstimator {
    pub fn estimate(&self, info: &mut EstimationInfo) {
        info.min_cost = self.min_cost;
    }
}

pub fn get_estimator(
    info: &mut EstimationInfo,
    adjusted_cost: Cost,
    cfg: &BeautyHashConfig,
) -> Option<BeautyHashEstimator> {
    if !info.try_next {
        return None;
    }
    let (first, second, third) = factors_for(adjusted_cost, cfg.seed);
    let min_cost = match info.rank {
        0 => {
            if adjusted_cost > 0 {
                info.rank += 1;
                adjusted_cost * first
            } else {
                info.try_next = false;
                adjusted_cost
            }
        }
        1 => {
            info.rank += 1;
            adjusted_cost * second
        }
        2 => {
            info.rank += 1;
            adjusted_cost * third
        }
        _ => {
            info.try_next = false;
            return None;
        }
    };
    Some(BeautyHashEstimator { min_cost })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_selects_table_entry_zero() {
        let mut info = EstimationInfo::default();
        let cfg = BeautyHashConfig { seed: 2 };

        let step = get_estimator(&mut info, 7, &cfg).unwrap();
        step.estimate(&mut info);
        assert_eq!(info.min_cost, 7);

        let step = get_estimator(&mut info, 7, &cfg).unwrap();
        step.estimate(&mut info);
        assert_eq!(info.min_cost, 14);

        let step = get_estimator(&mut info, 7, &cfg).unwrap();
        step.estimate(&mut info);
        assert_eq!(info.min_cost, 21);

        assert!(get_estimator(&mut info, 7, &cfg).is_none());
    }
}

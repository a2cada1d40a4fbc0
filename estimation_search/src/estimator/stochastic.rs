//! Stochastic ladder: used exclusively by the synchronic engine. Each rank
//! past the perfect-knowledge shortcut is gated by a configured probability,
//! and drawing an estimator may incur a simulated delay through a [`Clock`].

use std::time::Duration;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::estimation_info::{Cost, EstimationInfo};

pub const UNCERTAINTY_FACTOR: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochasticConfig {
    pub first_estimator_probability: f64,
    pub second_estimator_probability: f64,
    pub third_estimator_probability: f64,
    pub edge_estimation_avg_time_micros: u64,
    pub edge_estimation_time_interval_micros: u64,
}

impl Default for StochasticConfig {
    fn default() -> Self {
        Self {
            first_estimator_probability: 0.1,
            second_estimator_probability: 1.0,
            third_estimator_probability: 1.0,
            edge_estimation_avg_time_micros: 0,
            edge_estimation_time_interval_micros: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StochasticEstimator {
    min_cost: Cost,
    max_cost: Cost,
    delay: Option<Duration>,
}

impl StochasticEstimator {
    pub fn estimate(&self, info: &mut EstimationInfo, clock: &dyn Clock) {
        if let Some(delay) = self.delay {
            clock.sleep(delay);
        }
        info.min_cost = self.min_cost;
        info.max_cost = self.max_cost;
    }

    pub fn bounds_ratio(&self) -> f64 {
        if self.min_cost == 0 {
            1.0
        } else {
            self.max_cost as f64 / self.min_cost as f64
        }
    }
}

/// `avg ± interval/2` microseconds, or no delay at all when `avg` doesn't
/// exceed half the jitter interval (matching the original's "only when avg
/// > jitter/2" guard).
fn sample_delay(cfg: &StochasticConfig, rng: &mut dyn RngCore) -> Option<Duration> {
    let avg = cfg.edge_estimation_avg_time_micros as i64;
    let half_interval = (cfg.edge_estimation_time_interval_micros / 2) as i64;
    if avg <= half_interval {
        return None;
    }
    let offset = if half_interval == 0 {
        0
    } else {
        (rng.next_u64() % (2 * half_interval as u64 + 1)) as i64 - half_interval
    };
    Some(Duration::from_micros((avg + offset).max(0) as u64))
}

/// Draws a uniform sample in `[0, 1)` from the injected RNG.
fn uniform_sample(rng: &mut dyn RngCore) -> f64 {
    (rng.next_u32() as f64) / (u32::MAX as f64 + 1.0)
}

pub fn get_estimator(
    info: &mut EstimationInfo,
    adjusted_cost: Cost,
    cfg: &StochasticConfig,
    rng: &mut dyn RngCore,
) -> Option<StochasticEstimator> {
    if !info.try_next {
        return None;
    }

    if info.rank == 0 && adjusted_cost == 0 {
        info.try_next = false;
        return Some(StochasticEstimator {
            min_cost: 0,
            max_cost: 0,
            delay: None,
        });
    }

    let entering_rank = info.rank;
    if entering_rank < 3 {
        info.rank += 1;
    } else {
        info.try_next = false;
        return None;
    }

    let probability = match info.rank {
        1 => cfg.first_estimator_probability,
        2 => cfg.second_estimator_probability,
        3 => cfg.third_estimator_probability,
        _ => unreachable!("rank is clamped to 1..=3 above"),
    };
    if uniform_sample(rng) >= probability {
        info.try_next = false;
        // Rank 0 failing its probability draw isn't a dead end: it falls
        // back to perfect knowledge rather than terminating the ladder.
        // Only ranks 1 and 2 failing their draw terminate it with `None`.
        return if entering_rank == 0 {
            Some(StochasticEstimator {
                min_cost: adjusted_cost,
                max_cost: adjusted_cost,
                delay: None,
            })
        } else {
            None
        };
    }

    let cost = adjusted_cost as f64;
    let (min_cost, max_cost) = match info.rank {
        1 => (adjusted_cost, (2.0 * cost * UNCERTAINTY_FACTOR).round() as Cost),
        2 => (2 * adjusted_cost, (2.0 * cost * UNCERTAINTY_FACTOR).round() as Cost),
        3 => {
            let perfect = (cost * UNCERTAINTY_FACTOR).round() as Cost;
            (perfect, perfect)
        }
        _ => unreachable!("rank is clamped to 1..=3 above"),
    };
    if info.rank == 3 {
        info.try_next = false;
    }

    let delay = sample_delay(cfg, rng);
    Some(StochasticEstimator {
        min_cost,
        max_cost,
        delay,
    })
}

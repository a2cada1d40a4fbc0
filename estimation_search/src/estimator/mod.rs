//! Edge-cost estimator ladder.
//!
//! Four concrete ladders share one capability: a factory keyed on
//! `(info, adjusted_cost, ...config)` and an `estimate` operation that writes
//! bounds into the supplied [`EstimationInfo`]. Rather than a trait object or
//! an inheritance hierarchy, each engine family gets a small tagged enum over
//! its two candidate ladders — the Beauty engine chooses between
//! [`beauty`]/[`beauty_hash`], the Synchronic engine between
//! [`ontario`]/[`stochastic`].

pub mod beauty;
pub mod beauty_hash;
pub mod ontario;
pub mod stochastic;

use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::estimation_info::{Cost, EstimationInfo};

pub use beauty::BeautyConfig;
pub use beauty_hash::BeautyHashConfig;
pub use ontario::OntarioEstimator;
pub use stochastic::StochasticConfig;

/// Which scalar-bound ladder the Beauty engine drives. The hash-selected
/// variant is the more commonly deployed one, so it is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeautyLadderKind {
    Beauty,
    BeautyHash,
}

impl Default for BeautyLadderKind {
    fn default() -> Self {
        Self::BeautyHash
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BeautyLadderConfig {
    pub kind: BeautyLadderKind,
    pub beauty: BeautyConfig,
    pub beauty_hash: BeautyHashConfig,
}

#[derive(Debug, Clone, Copy)]
pub enum BeautyStep {
    Beauty(beauty::BeautyEstimator),
    BeautyHash(beauty_hash::BeautyHashEstimator),
}

impl BeautyStep {
    pub fn estimate(&self, info: &mut EstimationInfo) {
        match self {
            BeautyStep::Beauty(estimator) => estimator.estimate(info),
            BeautyStep::BeautyHash(estimator) => estimator.estimate(info),
        }
    }
}

pub fn get_beauty_step(
    info: &mut EstimationInfo,
    adjusted_cost: Cost,
    cfg: &BeautyLadderConfig,
) -> Option<BeautyStep> {
    match cfg.kind {
        BeautyLadderKind::Beauty => {
            beauty::get_estimator(info, adjusted_cost, &cfg.beauty).map(BeautyStep::Beauty)
        }
        BeautyLadderKind::BeautyHash => {
            beauty_hash::get_estimator(info, adjusted_cost, &cfg.beauty_hash).map(BeautyStep::BeautyHash)
        }
    }
}

/// Which two-bound ladder the Synchronic engine drives. Ontario is the
/// default; Stochastic is also usable by the synchronic mode, so both are
/// selectable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynchronicLadder {
    Ontario,
    Stochastic,
}

impl Default for SynchronicLadder {
    fn default() -> Self {
        Self::Ontario
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SynchronicLadderConfig {
    pub ladder: SynchronicLadder,
    pub stochastic: StochasticConfig,
}

pub enum SynchronicStep {
    Ontario(ontario::OntarioEstimator),
    Stochastic(stochastic::StochasticEstimator),
}

impl SynchronicStep {
    /// `> 1.0` means this estimator actually narrowed the interval; the
    /// perfect-knowledge shortcuts of both ladders report `1.0`.
    pub fn bounds_ratio(&self) -> f64 {
        match self {
            SynchronicStep::Ontario(estimator) => estimator.bounds_ratio(),
            SynchronicStep::Stochastic(estimator) => estimator.bounds_ratio(),
        }
    }

    pub fn estimate(&self, info: &mut EstimationInfo, clock: &dyn Clock) {
        match self {
            SynchronicStep::Ontario(estimator) => estimator.estimate(info),
            SynchronicStep::Stochastic(estimator) => estimator.estimate(info, clock),
        }
    }
}

pub fn get_synchronic_step(
    info: &mut EstimationInfo,
    adjusted_cost: Cost,
    cfg: &SynchronicLadderConfig,
    rng: &mut dyn RngCore,
) -> Option<SynchronicStep> {
    match cfg.ladder {
        SynchronicLadder::Ontario => {
            ontario::get_estimator(info, adjusted_cost).map(SynchronicStep::Ontario)
        }
        SynchronicLadder::Stochastic => {
            stochastic::get_estimator(info, adjusted_cost, &cfg.stochastic, rng).map(SynchronicStep::Stochastic)
        }
    }
}

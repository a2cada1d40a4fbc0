//! Configuration surface, serde/TOML-deserializable following
//! `lib_tsalign/src/config.rs` and `tsalign/src/align.rs`'s `toml::from_str`
//! pattern. `engine_configs` is a plain `Vec<EngineConfig>` rather than a
//! parse-tree indirection, since there is no external plugin/option-parser
//! system here to reparse against.

use serde::{Deserialize, Serialize};

use crate::estimation_info::{Cost, INFINITE};
use crate::estimator::{BeautyLadderConfig, SynchronicLadderConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Allow a CLOSED node to be reopened on a strictly better bound.
    pub reopen_closed: bool,
    /// Upper bound on accumulated `real_g`; edges that would breach it are
    /// silently skipped.
    pub bound: Cost,

    /// Beauty mode: stop spending estimation once `min_g > l_est`.
    pub l_est: Cost,
    /// Beauty mode: discard a successor once `min_g > l_prune`.
    pub l_prune: Cost,

    pub beauty_ladder: BeautyLadderConfig,
    pub synchronic_ladder: SynchronicLadderConfig,

    /// Synchronic mode: the permitted ratio of upper to lower bound.
    pub epsilon: f64,
    /// IteratedSync: the ratio target of the first iteration.
    pub initial_epsilon: f64,

    /// Enable the synchronic end-of-search ratio-refinement pass.
    pub end_of_search_estimations: bool,

    /// IteratedSync controller.
    pub shrinkage_factor: f64,
    pub threshold: f64,

    /// AnytimeBeauty controller.
    pub max_iter: u32,

    /// Child engine configurations for drivers (`IteratedSync`,
    /// `AnytimeBeauty`); empty is a configuration error (`EmptyEngineConfigs`).
    pub engine_configs: Vec<EngineConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reopen_closed: false,
            bound: INFINITE,
            l_est: 0,
            l_prune: INFINITE,
            beauty_ladder: BeautyLadderConfig::default(),
            synchronic_ladder: SynchronicLadderConfig::default(),
            epsilon: 1.0,
            initial_epsilon: 1.0,
            end_of_search_estimations: false,
            shrinkage_factor: 1.0,
            threshold: 0.1,
            max_iter: 10,
            engine_configs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec_table() {
        let cfg = EngineConfig::default();
        assert!(!cfg.reopen_closed);
        assert_eq!(cfg.bound, INFINITE);
        assert_eq!(cfg.l_est, 0);
        assert_eq!(cfg.l_prune, INFINITE);
        assert_eq!(cfg.beauty_ladder.beauty.factor_first, 1);
        assert_eq!(cfg.beauty_ladder.beauty.factor_second, 3);
        assert_eq!(cfg.beauty_ladder.beauty.factor_third, 4);
        assert_eq!(cfg.epsilon, 1.0);
        assert_eq!(cfg.initial_epsilon, 1.0);
        assert_eq!(cfg.shrinkage_factor, 1.0);
        assert_eq!(cfg.threshold, 0.1);
        assert_eq!(cfg.max_iter, 10);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = EngineConfig::default();
        let serialized = toml::to_string(&cfg).expect("EngineConfig must serialize");
        let parsed: EngineConfig = toml::from_str(&serialized).expect("EngineConfig must parse back");
        assert_eq!(parsed.l_prune, cfg.l_prune);
    }
}

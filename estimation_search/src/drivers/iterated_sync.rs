//! The `IteratedSync` driver: repeats the Synchronic engine with a shrinking
//! `target_epsilon`, controlled by an overshoot/shrinkage feedback loop.

use rand::RngCore;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::drivers::{fold_iteration_statistics, DriverStatus};
use crate::engines::synchronic::SynchronicEngine;
use crate::engines::SearchStatus;
use crate::error::Error;
use crate::estimation_info::Cost;
use crate::statistics::SearchStatistics;
use crate::task::{Evaluator, OpenList, PruningMethod, Task};

#[derive(Debug, Clone)]
pub struct IteratedSyncResult<StateId, OperatorId> {
    pub goal: Option<StateId>,
    pub plan: Vec<OperatorId>,
    pub real_g: Cost,
    pub min_g: Cost,
    pub max_g: Cost,
    /// The best uncertainty ratio achieved across all iterations.
    pub best_uncertainty_bound: f64,
    pub iterations: u32,
    pub statistics: SearchStatistics,
    pub status: DriverStatus,
}

/// Runs the `IteratedSync` controller. Takes ownership of the task,
/// evaluator, open list, pruning method, clock and RNG; each iteration
/// builds a fresh [`SynchronicEngine`] around them (via
/// [`SynchronicEngine::into_parts`], clearing the open list in between) so
/// per-collaborator state (a stateful pruning method, the RNG stream) survives
/// across iterations while the search space and per-iteration statistics
/// start clean.
#[allow(clippy::too_many_arguments)]
pub fn run<T, E, O, P, C>(
    task: T,
    evaluator: E,
    open_list: O,
    pruning: P,
    clock: C,
    rng: Box<dyn RngCore>,
    cfg: &EngineConfig,
) -> Result<IteratedSyncResult<T::StateId, T::OperatorId>, Error>
where
    T: Task,
    E: Evaluator<T>,
    O: OpenList<T>,
    P: PruningMethod<T>,
    C: Clock + Clone,
{
    if cfg.engine_configs.is_empty() {
        return Err(Error::EmptyEngineConfigs);
    }
    let child_template = cfg.engine_configs[0].clone();

    let mut task = task;
    let mut evaluator = evaluator;
    let mut open_list = open_list;
    let mut pruning = pruning;
    let mut rng = rng;

    let mut overshoot = 1.0f64;
    let mut target_epsilon = f64::INFINITY;
    let mut best_uncertainty_bound = f64::INFINITY;
    let mut best: Option<(Option<T::StateId>, Vec<T::OperatorId>, Cost, Cost, Cost)> = None;
    let mut total_statistics = SearchStatistics::new();

    let mut iter: u32 = 1;
    let status = loop {
        if iter > 1 && target_epsilon == 1.0 {
            break if best_uncertainty_bound <= child_template.epsilon {
                DriverStatus::Solved
            } else {
                DriverStatus::Failed
            };
        }
        if iter > child_template.max_iter {
            break DriverStatus::Failed;
        }

        if iter == 1 {
            target_epsilon = child_template.initial_epsilon;
        } else {
            let curr = 1.0 + child_template.shrinkage_factor * (child_template.initial_epsilon - 1.0) / overshoot;
            if (1.0 - curr / target_epsilon) > child_template.threshold {
                target_epsilon = curr;
            } else {
                target_epsilon = 1.0;
            }
        }

        let mut child_cfg = child_template.clone();
        child_cfg.epsilon = target_epsilon;

        let mut engine = SynchronicEngine::new(task, evaluator, open_list, pruning, clock_for_iteration(&clock), rng, &child_cfg, target_epsilon)?;
        let result = engine.search();
        let iteration_statistics = *engine.statistics();
        fold_iteration_statistics(&mut total_statistics, &iteration_statistics);
        let parts = engine.into_parts();
        task = parts.0;
        evaluator = parts.1;
        open_list = parts.2;
        pruning = parts.3;
        rng = parts.5;
        open_list.clear();

        let eta_effective = match &result {
            SearchStatus::Solved(solved) => solved.uncertainty_ratio,
            SearchStatus::Failed => f64::INFINITY,
        };

        if target_epsilon == 1.0 {
            overshoot = if eta_effective == 1.0 { 1.0 } else { f64::INFINITY };
        } else {
            overshoot = (eta_effective - 1.0) / (target_epsilon - 1.0);
        }

        if eta_effective < best_uncertainty_bound {
            best_uncertainty_bound = eta_effective;
            if let SearchStatus::Solved(solved) = result {
                best = Some((Some(solved.goal), solved.plan, solved.real_g, solved.min_g, solved.max_g));
            }
        }

        if best_uncertainty_bound <= child_template.epsilon {
            break DriverStatus::Solved;
        }

        iter += 1;
    };

    let (goal, plan, real_g, min_g, max_g) = best.unwrap_or_default();
    Ok(IteratedSyncResult {
        goal,
        plan,
        real_g,
        min_g,
        max_g,
        best_uncertainty_bound,
        iterations: iter,
        statistics: total_statistics,
        status,
    })
}

/// The Stochastic ladder's clock is consumed by value per search; cloning it
/// for each iteration is cheap (it's a stateless strategy marker, not a
/// resource) and keeps the driver from having to special-case the last
/// iteration's ownership.
fn clock_for_iteration<C: Clock + Clone>(clock: &C) -> C {
    clock.clone()
}

impl<StateId, OperatorId> Default for IteratedSyncResult<StateId, OperatorId> {
    fn default() -> Self {
        Self {
            goal: None,
            plan: Vec::new(),
            real_g: 0,
            min_g: 0,
            max_g: 0,
            best_uncertainty_bound: f64::INFINITY,
            iterations: 0,
            statistics: SearchStatistics::new(),
            status: DriverStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::NoopClock;
    use crate::estimator::{SynchronicLadder, SynchronicLadderConfig};
    use crate::open_list::EstimatedGOpenList;
    use crate::task::{EstimatedGEvaluator, NoPruning};
    use rand::SeedableRng;
    use rand::rngs::SmallRng;
    use std::collections::HashMap;

    struct DagTask {
        edges: HashMap<u32, Vec<(u32, Cost, u32)>>,
        goal: u32,
    }

    impl Task for DagTask {
        type StateId = u32;
        type OperatorId = u32;

        fn initial_state(&self) -> u32 {
            0
        }
        fn is_goal(&self, state: &u32) -> bool {
            *state == self.goal
        }
        fn applicable_operators(&self, state: &u32) -> Vec<u32> {
            self.edges
                .get(state)
                .map(|edges| edges.iter().map(|(op, _, _)| *op).collect())
                .unwrap_or_default()
        }
        fn operator_cost(&self, op: &u32) -> Cost {
            self.edges
                .values()
                .flatten()
                .find(|(candidate, _, _)| candidate == op)
                .map(|(_, cost, _)| *cost)
                .expect("operator must exist")
        }
        fn apply(&self, state: &u32, op: &u32) -> u32 {
            self.edges[state]
                .iter()
                .find(|(candidate, _, _)| candidate == op)
                .map(|(_, _, succ)| *succ)
                .expect("operator must be applicable to state")
        }
    }

    #[test]
    fn empty_engine_configs_is_a_configuration_error() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 10, 1u32)]);
        let task = DagTask { edges, goal: 1 };
        let cfg = EngineConfig::default();

        let result = run(
            task,
            EstimatedGEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            NoopClock,
            Box::new(SmallRng::seed_from_u64(0)),
            &cfg,
        );
        assert!(matches!(result, Err(Error::EmptyEngineConfigs)));
    }

    #[test]
    fn shrinks_to_ratio_one_when_the_ladder_can_reach_perfect_knowledge() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 10, 1u32)]);
        let task = DagTask { edges, goal: 1 };

        let child = EngineConfig {
            synchronic_ladder: SynchronicLadderConfig {
                ladder: SynchronicLadder::Stochastic,
                stochastic: crate::estimator::StochasticConfig {
                    first_estimator_probability: 1.0,
                    second_estimator_probability: 1.0,
                    third_estimator_probability: 1.0,
                    ..Default::default()
                },
            },
            initial_epsilon: 2.0,
            epsilon: 1.0,
            shrinkage_factor: 1.0,
            threshold: 0.1,
            max_iter: 10,
            ..Default::default()
        };
        let cfg = EngineConfig {
            engine_configs: vec![child],
            ..Default::default()
        };

        let result = run(
            task,
            EstimatedGEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            NoopClock,
            Box::new(SmallRng::seed_from_u64(3)),
            &cfg,
        )
        .expect("engine_configs is non-empty");

        assert_eq!(result.status, DriverStatus::Solved);
        assert_eq!(result.best_uncertainty_bound, 1.0);
        assert_eq!(result.plan, vec![1]);
    }
}

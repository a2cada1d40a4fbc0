//! The `AnytimeBeauty` driver: repeats the Beauty engine with progressively
//! tightened `l_est`/`l_prune` thresholds derived from the previous
//! iteration's refined bounds.

use crate::config::EngineConfig;
use crate::drivers::{fold_iteration_statistics, DriverStatus};
use crate::engines::beauty::BeautyEngine;
use crate::engines::SearchStatus;
use crate::error::Error;
use crate::estimation_info::{Cost, INFINITE};
use crate::statistics::SearchStatistics;
use crate::task::{Evaluator, OpenList, PruningMethod, Task};

#[derive(Debug, Clone)]
pub struct AnytimeBeautyResult<StateId, OperatorId> {
    pub goal: Option<StateId>,
    pub plan: Vec<OperatorId>,
    pub real_g: Cost,
    pub l_low: Cost,
    pub l_high: Cost,
    pub opt: bool,
    pub iterations: u32,
    pub statistics: SearchStatistics,
    pub status: DriverStatus,
}

/// Runs the `AnytimeBeauty` controller. Like
/// [`crate::drivers::iterated_sync::run`], takes ownership of the task,
/// evaluator, open list and pruning method and threads them through
/// [`BeautyEngine::into_parts`] across iterations.
pub fn run<T, E, O, P>(
    task: T,
    evaluator: E,
    open_list: O,
    pruning: P,
    cfg: &EngineConfig,
) -> Result<AnytimeBeautyResult<T::StateId, T::OperatorId>, Error>
where
    T: Task,
    E: Evaluator<T>,
    O: OpenList<T>,
    P: PruningMethod<T>,
{
    if cfg.engine_configs.is_empty() {
        return Err(Error::EmptyEngineConfigs);
    }
    let child_template = cfg.engine_configs[0].clone();
    let max_iter = child_template.max_iter;

    let mut task = task;
    let mut evaluator = evaluator;
    let mut open_list = open_list;
    let mut pruning = pruning;

    let mut last_l_low: Cost = 0;
    let mut last_l_high: Cost = INFINITE;
    let mut best_l_high: Cost = INFINITE;
    let mut best: Option<(Option<T::StateId>, Vec<T::OperatorId>, Cost, Cost, Cost, bool)> = None;
    let mut total_statistics = SearchStatistics::new();

    let mut iter: u32 = 1;
    let status = loop {
        if iter > max_iter {
            return Err(Error::IterationLimitExceeded { iter, max_iter });
        }

        let (l_est, l_prune) = if iter == 1 {
            (0, INFINITE)
        } else if iter == max_iter {
            (last_l_high, last_l_high)
        } else {
            (last_l_low, last_l_high)
        };

        let mut child_cfg = child_template.clone();
        child_cfg.l_est = l_est;
        child_cfg.l_prune = l_prune;

        let mut engine = BeautyEngine::new(task, evaluator, open_list, pruning, &child_cfg)?;
        let result = engine.search();
        let iteration_statistics = *engine.statistics();
        fold_iteration_statistics(&mut total_statistics, &iteration_statistics);
        let parts = engine.into_parts();
        task = parts.0;
        evaluator = parts.1;
        open_list = parts.2;
        pruning = parts.3;
        open_list.clear();

        match result {
            SearchStatus::Failed => break DriverStatus::Failed,
            SearchStatus::Solved(solved) => {
                last_l_low = solved.l_low;
                last_l_high = solved.l_high;
                let opt = solved.opt;

                if solved.l_high <= best_l_high {
                    best_l_high = solved.l_high;
                    best = Some((
                        Some(solved.goal),
                        solved.plan,
                        solved.real_g,
                        solved.l_low,
                        solved.l_high,
                        opt,
                    ));
                }

                if opt {
                    break DriverStatus::Solved;
                }
            }
        }

        iter += 1;
    };

    let (goal, plan, real_g, l_low, l_high, opt) = best.unwrap_or_default();
    Ok(AnytimeBeautyResult {
        goal,
        plan,
        real_g,
        l_low,
        l_high,
        opt,
        iterations: iter,
        statistics: total_statistics,
        status,
    })
}

impl<StateId, OperatorId> Default for AnytimeBeautyResult<StateId, OperatorId> {
    fn default() -> Self {
        Self {
            goal: None,
            plan: Vec::new(),
            real_g: 0,
            l_low: 0,
            l_high: INFINITE,
            opt: false,
            iterations: 0,
            statistics: SearchStatistics::new(),
            status: DriverStatus::Failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_list::EstimatedGOpenList;
    use crate::task::{EstimatedGEvaluator, NoPruning};
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
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        let task = DagTask { edges, goal: 1 };
        let cfg = EngineConfig::default();

        let result = run(task, EstimatedGEvaluator, EstimatedGOpenList::new(), NoPruning, &cfg);
        assert!(matches!(result, Err(Error::EmptyEngineConfigs)));
    }

    #[test]
    fn converges_to_an_optimality_certificate_within_a_few_iterations() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        let task = DagTask { edges, goal: 1 };

        let child = EngineConfig {
            max_iter: 5,
            ..Default::default()
        };
        let cfg = EngineConfig {
            engine_configs: vec![child],
            ..Default::default()
        };

        let result = run(task, EstimatedGEvaluator, EstimatedGOpenList::new(), NoPruning, &cfg)
            .expect("engine_configs is non-empty");

        assert_eq!(result.status, DriverStatus::Solved);
        assert!(result.opt);
        assert_eq!(result.plan, vec![1]);
        assert_eq!(result.real_g, 4);
    }

    #[test]
    fn exceeding_max_iter_is_a_critical_error() {
        // A task with no edges out of the root is never solvable, so the
        // driver keeps iterating (each iteration reports FAILED immediately,
        // which itself breaks the loop) -- to exercise the iteration-limit
        // path instead we cap max_iter at zero, which is exceeded on the very
        // first iteration.
        let task = DagTask {
            edges: HashMap::new(),
            goal: 1,
        };
        let child = EngineConfig {
            max_iter: 0,
            ..Default::default()
        };
        let cfg = EngineConfig {
            engine_configs: vec![child],
            ..Default::default()
        };

        let result = run(task, EstimatedGEvaluator, EstimatedGOpenList::new(), NoPruning, &cfg);
        assert!(matches!(result, Err(Error::IterationLimitExceeded { iter: 1, max_iter: 0 })));
    }
}

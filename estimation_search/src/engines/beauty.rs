//! The `Beauty` engine: a best-first loop that drives estimation until
//! `min_g > l_est`, then either prunes the successor (`min_g > l_prune`) or
//! opens it with the tightened bound. End-of-search refinement continues
//! each plan edge's ladder to its limit and checks whether the plan is
//! certifiably optimal against the next-best open-list entry.

use crate::config::EngineConfig;
use crate::engines::SearchEngineContext;
use crate::engines::SearchStatus;
use crate::error::Error;
use crate::estimation_info::{add_cost, Cost, EstimationInfo, INFINITE};
use crate::estimator::{get_beauty_step, BeautyLadderConfig};
use crate::search_space::{SearchNode, SearchSpace};
use crate::statistics::SearchStatistics;
use crate::task::{EvalContext, Evaluator, OpenList, PruningMethod, Task};

#[derive(Debug, Clone)]
pub struct BeautyResult<StateId, OperatorId> {
    pub goal: StateId,
    pub plan: Vec<OperatorId>,
    pub real_g: Cost,
    pub l_low: Cost,
    pub l_high: Cost,
    pub opt: bool,
}

pub struct BeautyEngine<T: Task, E, O, P> {
    task: T,
    evaluator: E,
    open_list: O,
    pruning: P,
    search_space: SearchSpace<T::StateId, T::OperatorId>,
    statistics: SearchStatistics,
    reopen_closed: bool,
    bound: Cost,
    l_est: Cost,
    l_prune: Cost,
    ladder: BeautyLadderConfig,
}

impl<T, E, O, P> SearchEngineContext<T> for BeautyEngine<T, E, O, P>
where
    T: Task,
{
    fn task(&self) -> &T {
        &self.task
    }
    fn search_space(&self) -> &SearchSpace<T::StateId, T::OperatorId> {
        &self.search_space
    }
    fn statistics(&self) -> &SearchStatistics {
        &self.statistics
    }
    fn bound(&self) -> Cost {
        self.bound
    }
}

impl<T, E, O, P> BeautyEngine<T, E, O, P>
where
    T: Task,
    E: Evaluator<T>,
    O: OpenList<T>,
    P: PruningMethod<T>,
{
    /// Gives the task, evaluator, open list and pruning method back to the
    /// caller, discarding this engine's search space and statistics. Used by
    /// [`crate::drivers::anytime_beauty`] to rebuild a fresh engine around the
    /// same collaborators on the next iteration without losing their state
    /// (an evaluator's `notify_*` hooks, a stateful pruning method, ...).
    pub fn into_parts(self) -> (T, E, O, P) {
        (self.task, self.evaluator, self.open_list, self.pruning)
    }

    pub fn new(
        task: T,
        evaluator: E,
        open_list: O,
        mut pruning: P,
        cfg: &EngineConfig,
    ) -> Result<Self, Error> {
        if evaluator.is_lazy() && !evaluator.caches_estimates() {
            return Err(Error::LazyEvaluatorNotCaching);
        }
        pruning.initialize(&task);
        Ok(Self {
            task,
            evaluator,
            open_list,
            pruning,
            search_space: SearchSpace::new(),
            statistics: SearchStatistics::new(),
            reopen_closed: cfg.reopen_closed,
            bound: cfg.bound,
            l_est: cfg.l_est,
            l_prune: cfg.l_prune,
            ladder: cfg.beauty_ladder,
        })
    }

    pub fn search(&mut self) -> SearchStatus<BeautyResult<T::StateId, T::OperatorId>> {
        let initial_id = self.task.initial_state();
        let mut initial = self.search_space.node(&initial_id);
        initial.open_initial();
        self.evaluator.notify_initial_state(&initial_id);
        self.statistics.inc_generated(1);
        let eval_ctx = EvalContext {
            state: &initial_id,
            g: 0,
            estimation_info: Some(initial.estimation()),
        };
        self.open_list.insert(&eval_ctx, initial_id.clone());
        self.search_space.store(initial);

        loop {
            let Some(state_id) = self.open_list.remove_min() else {
                return SearchStatus::Failed;
            };
            let mut node = self.search_space.node(&state_id);
            if node.is_closed() || node.is_dead_end() {
                continue;
            }

            if self.evaluator.is_lazy() && self.revalidate_lazily(&state_id, &mut node) {
                continue;
            }

            if self.task.is_goal(&state_id) {
                node.close();
                self.statistics.inc_expanded(1);
                self.statistics.report_f_value_progress(node.min_g());
                self.search_space.store(node);
                return SearchStatus::Solved(self.refine_end_of_search(&state_id));
            }

            self.statistics.report_f_value_progress(node.min_g());
            node.close();
            self.statistics.inc_expanded(1);
            let closed_node = node.clone();
            self.search_space.store(node);

            let mut operators = self.task.applicable_operators(&state_id);
            self.statistics.inc_generated_ops(operators.len() as u64);
            self.pruning.prune_operators(&state_id, &mut operators);

            for op in operators {
                self.expand_edge(&state_id, &closed_node, &op);
            }
        }
    }

    /// Lazy revalidation: re-run the evaluator against the popped state's
    /// current bounds. A freshly-discovered dead end is marked and the caller should
    /// skip this pop; a value that no longer matches the cached `min_g` is
    /// reinserted at its corrected priority and the caller should also skip
    /// this pop (the open list may still hold a stale duplicate, which is
    /// fine — duplicates are filtered by the closed/dead-end check on pop).
    /// Returns `true` in both cases.
    fn revalidate_lazily(&mut self, state_id: &T::StateId, node: &mut SearchNode<T::StateId, T::OperatorId>) -> bool {
        let g = node.g();
        let estimation = *node.estimation();
        let ctx = EvalContext {
            state: state_id,
            g,
            estimation_info: Some(&estimation),
        };
        let result = self.evaluator.compute_result(&ctx);
        self.statistics.inc_evaluations(1);
        if result.is_dead_end() {
            self.statistics.inc_dead_ends(1);
            node.mark_as_dead_end();
            self.search_space.store(node.clone());
            return true;
        }
        if result.value != Some(estimation.min_g) {
            self.search_space.store(node.clone());
            self.statistics.inc_evaluated_states(1);
            self.open_list.insert(&ctx, state_id.clone());
            return true;
        }
        false
    }

    fn expand_edge(
        &mut self,
        parent_id: &T::StateId,
        parent: &SearchNode<T::StateId, T::OperatorId>,
        op: &T::OperatorId,
    ) {
        let op_real_cost = self.task.operator_cost(op);
        if add_cost(parent.real_g(), op_real_cost) >= self.bound {
            return;
        }

        let succ_id = self.task.apply(parent_id, op);
        let mut succ = self.search_space.node(&succ_id);
        if succ.is_dead_end() {
            return;
        }

        self.statistics.inc_edges(1);
        let adjusted_cost = self.task.adjusted_cost(op);
        let is_new = succ.is_new();
        let same_edge = !is_new && succ.is_same_edge(parent, op);

        let mut info = if is_new {
            EstimationInfo::default()
        } else {
            self.search_space.set_estimation_info_based_on_edge(parent, &succ)
        };

        self.statistics.inc_estimated_edges(1);
        // Re-encountered states also stop once no improvement is possible
        // against the previously recorded bound. With `l_est == 0` this
        // effectively disables re-estimation on the first pass, which is
        // intentional for AnytimeBeauty's first iteration.
        let stop_at_min_g = if is_new { None } else { Some(succ.min_g()) };
        beauty_estimation_loop(
            &mut info,
            parent.min_g(),
            adjusted_cost,
            self.l_est,
            stop_at_min_g,
            &self.ladder,
            &mut self.statistics,
        );

        if is_new {
            if info.min_g > self.l_prune {
                self.statistics.inc_pruned_states(1);
                succ.mark_as_dead_end();
                self.search_space.store(succ);
                return;
            }
            succ.open(parent, op.clone(), op_real_cost, adjusted_cost, &info);
            self.statistics.inc_generated(1);
            let g = succ.g();
            self.evaluate_and_insert(&succ_id, &info, g);
            self.search_space.store(succ);
            return;
        }

        if same_edge && info.rank <= succ.estimation().rank {
            self.search_space.store(succ);
            return;
        }

        if info.min_g < succ.min_g() && info.min_g <= self.l_prune {
            let was_closed = succ.is_closed();
            if was_closed && !self.reopen_closed {
                succ.set_estimation(info);
                self.search_space.store(succ);
                return;
            }
            if was_closed {
                self.statistics.inc_reopened(1);
                succ.reopen(parent, op.clone(), op_real_cost, adjusted_cost, &info);
            } else {
                succ.update_parent(parent, op.clone(), op_real_cost, adjusted_cost, &info);
            }
            let g = succ.g();
            self.evaluate_and_insert(&succ_id, &info, g);
        } else {
            succ.set_estimation(info);
        }
        self.search_space.store(succ);
    }

    fn evaluate_and_insert(&mut self, state_id: &T::StateId, info: &EstimationInfo, g: Cost) {
        let ctx = EvalContext {
            state: state_id,
            g,
            estimation_info: Some(info),
        };
        let result = self.evaluator.compute_result(&ctx);
        self.statistics.inc_evaluations(1);
        if result.is_dead_end() {
            self.statistics.inc_dead_ends(1);
            let mut node = self.search_space.node(state_id);
            node.mark_as_dead_end();
            self.search_space.store(node);
            return;
        }
        self.statistics.inc_evaluated_states(1);
        self.open_list.insert(&ctx, state_id.clone());
    }

    fn refine_end_of_search(
        &mut self,
        goal_id: &T::StateId,
    ) -> BeautyResult<T::StateId, T::OperatorId> {
        let plan = self.search_space.trace_path(goal_id);
        let real_g = self.search_space.node(goal_id).real_g();
        let l_low = self.search_space.node(goal_id).min_g();

        let mut current_id = goal_id.clone();
        loop {
            let current = self.search_space.node(&current_id);
            let Some(parent_id) = current.parent_state_id().cloned() else {
                break;
            };
            let op = current
                .creating_operator()
                .cloned()
                .expect("a node with a parent has a creating operator");
            let parent = self.search_space.node(&parent_id);
            let adjusted_cost = self.task.adjusted_cost(&op);

            let mut info = *current.estimation();
            loop {
                let Some(step) = get_beauty_step(&mut info, adjusted_cost, &self.ladder) else {
                    break;
                };
                step.estimate(&mut info);
                info.min_g = add_cost(parent.min_g(), info.min_cost);
                self.statistics.inc_estimations(1);
            }

            let mut current_mut = current;
            current_mut.set_estimation(info);
            self.search_space.store(current_mut);

            current_id = parent_id;
        }

        let l_high = self.search_space.node(goal_id).min_g();
        let l_alt = self
            .open_list
            .remove_min()
            .map(|id| self.search_space.node(&id).min_g())
            .unwrap_or(INFINITE);
        let opt = l_low <= l_alt || l_high == l_low;

        BeautyResult {
            goal: goal_id.clone(),
            plan,
            real_g,
            l_low,
            l_high,
            opt,
        }
    }
}

/// The Beauty mode estimation loop: spend estimation effort until
/// `min_g > l_est`, or the ladder is exhausted, or (for re-encountered
/// states) no further improvement over the recorded bound is possible.
fn beauty_estimation_loop(
    info: &mut EstimationInfo,
    parent_min_g: Cost,
    adjusted_cost: Cost,
    l_est: Cost,
    stop_at_min_g: Option<Cost>,
    ladder: &BeautyLadderConfig,
    stats: &mut SearchStatistics,
) {
    loop {
        if let Some(threshold) = stop_at_min_g {
            if info.min_g >= threshold {
                break;
            }
        }
        let Some(step) = get_beauty_step(info, adjusted_cost, ladder) else {
            break;
        };
        step.estimate(info);
        info.min_g = add_cost(parent_min_g, info.min_cost);
        stats.inc_estimations(1);
        match info.rank {
            1 => stats.inc_l1_estimations(1),
            2 => stats.inc_l2_estimations(1),
            3 => stats.inc_l3_estimations(1),
            _ => {}
        }
        if info.min_g > l_est {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_list::EstimatedGOpenList;
    use crate::task::{EstimatedGEvaluator, NoPruning};
    use std::collections::HashMap;

    /// A tiny in-memory weighted DAG: `edges[state]` lists `(operator, cost,
    /// successor)`. State `0` is initial; `goal` is the single goal state.
    struct DagTask {
        edges: HashMap<u32, Vec<(u32, Cost, u32)>>,
        goal: u32,
    }

    /// A lazy evaluator that never caches — a configuration error, since
    /// there is nothing for the lazy pop-time revalidation to compare
    /// against.
    #[derive(Default)]
    struct LazyNonCachingEvaluator;

    impl<T: Task> Evaluator<T> for LazyNonCachingEvaluator {
        fn compute_result(&mut self, ctx: &EvalContext<'_, T>) -> crate::task::EvaluationResult {
            crate::task::EvaluationResult::value(ctx.g)
        }
        fn is_lazy(&self) -> bool {
            true
        }
    }

    /// A lazy, caching evaluator that deterministically reports a state's
    /// `min_g` on every call, but counts how many times it was asked —
    /// letting a test confirm the pop-time lazy revalidation actually ran
    /// (one extra call per non-stale pop, beyond the one at insertion time)
    /// without otherwise perturbing the search.
    #[derive(Default)]
    struct CountingLazyEvaluator {
        calls: std::cell::RefCell<u64>,
    }

    impl Evaluator<DagTask> for CountingLazyEvaluator {
        fn compute_result(&mut self, ctx: &EvalContext<'_, DagTask>) -> crate::task::EvaluationResult {
            *self.calls.borrow_mut() += 1;
            let min_g = ctx.estimation_info.map(|est| est.min_g).unwrap_or(ctx.g);
            crate::task::EvaluationResult::value(min_g)
        }
        fn caches_estimates(&self) -> bool {
            true
        }
        fn is_lazy(&self) -> bool {
            true
        }
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
    fn trivial_one_edge_plan_solves_and_refinement_is_a_no_op_once_exhausted() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        let task = DagTask { edges, goal: 1 };

        // l_est/l_prune set high enough that the ladder already runs to
        // exhaustion (rank 3, try_next = false) during the initial
        // expansion, so the end-of-search refinement pass has nothing left
        // to tighten and l_low must equal l_high exactly.
        let cfg = EngineConfig {
            l_est: 1_000,
            l_prune: 1_000,
            beauty_ladder: BeautyLadderConfig {
                kind: crate::estimator::BeautyLadderKind::Beauty,
                beauty: crate::estimator::BeautyConfig {
                    factor_first: 1,
                    factor_second: 3,
                    factor_third: 4,
                },
                ..Default::default()
            },
            ..Default::default()
        };

        let mut engine = BeautyEngine::new(
            task,
            EstimatedGEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            &cfg,
        )
        .expect("EstimatedGEvaluator is not lazy");

        match engine.search() {
            SearchStatus::Solved(result) => {
                assert_eq!(result.real_g, 4);
                assert_eq!(result.l_low, 16);
                assert_eq!(result.l_high, 16);
                assert!(result.opt);
                assert_eq!(result.plan, vec![1]);
            }
            SearchStatus::Failed => panic!("expected a solution"),
        }
    }

    #[test]
    fn bound_below_every_edge_cost_fails_immediately() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        let task = DagTask { edges, goal: 1 };

        let cfg = EngineConfig {
            bound: 2,
            ..Default::default()
        };
        let mut engine = BeautyEngine::new(
            task,
            EstimatedGEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            &cfg,
        )
        .expect("EstimatedGEvaluator is not lazy");

        assert!(matches!(engine.search(), SearchStatus::Failed));
    }

    #[test]
    fn pruned_successor_is_never_reached() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 100, 1u32)]);
        let task = DagTask { edges, goal: 1 };

        let cfg = EngineConfig {
            l_prune: 10,
            ..Default::default()
        };
        let mut engine = BeautyEngine::new(
            task,
            EstimatedGEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            &cfg,
        )
        .expect("EstimatedGEvaluator is not lazy");

        assert!(matches!(engine.search(), SearchStatus::Failed));
        assert_eq!(engine.statistics().pruned_states(), 1);
    }

    #[test]
    fn lazy_evaluator_without_caching_is_a_configuration_error() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        let task = DagTask { edges, goal: 1 };
        let cfg = EngineConfig::default();

        let result = BeautyEngine::new(
            task,
            LazyNonCachingEvaluator,
            EstimatedGOpenList::new(),
            NoPruning,
            &cfg,
        );
        assert!(matches!(result, Err(Error::LazyEvaluatorNotCaching)));
    }

    #[test]
    fn lazy_caching_evaluator_is_revalidated_on_every_pop() {
        let mut edges = HashMap::new();
        edges.insert(0u32, vec![(1u32, 4, 1u32)]);
        edges.insert(1u32, vec![(2u32, 4, 2u32)]);
        let task = DagTask { edges, goal: 2 };
        let cfg = EngineConfig::default();

        let mut engine = BeautyEngine::new(
            task,
            CountingLazyEvaluator::default(),
            EstimatedGOpenList::new(),
            NoPruning,
            &cfg,
        )
        .expect("CountingLazyEvaluator caches its estimates");

        match engine.search() {
            SearchStatus::Solved(result) => assert_eq!(result.plan, vec![1, 2]),
            SearchStatus::Failed => panic!("expected a solution"),
        }
        // One evaluation per successor at insertion time (states 1 and 2),
        // plus one revalidation per pop that actually reaches expansion
        // (states 0, 1 and 2) -- strictly more than a non-lazy run's count.
        assert!(engine.statistics().evaluations() > engine.statistics().evaluated_states());
    }
}

//! The `SynchronicEstimationSearch` engine: a best-first
//! loop that drives estimation until a successor's uncertainty ratio
//! `max_g / min_g` falls to the configured `target_epsilon`, with no pruning
//! (unlike Beauty, every surviving successor is kept). End-of-search
//! refinement continues tightening the plan's bounds until the goal's ratio
//! itself satisfies `epsilon`.

use rand::RngCore;

use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::engines::SearchEngineContext;
use crate::engines::SearchStatus;
use crate::error::Error;
use crate::estimation_info::{add_cost, Cost, EstimationInfo};
use crate::estimator::{get_synchronic_step, SynchronicLadderConfig};
use crate::search_space::{SearchNode, SearchSpace};
use crate::statistics::SearchStatistics;
use crate::task::{EvalContext, Evaluator, OpenList, PruningMethod, Task};

#[derive(Debug, Clone)]
pub struct SynchronicResult<StateId, OperatorId> {
    pub goal: StateId,
    pub plan: Vec<OperatorId>,
    pub real_g: Cost,
    pub min_g: Cost,
    pub max_g: Cost,
    pub uncertainty_ratio: f64,
    pub solved_within_epsilon: bool,
}

pub struct SynchronicEngine<T: Task, E, O, P, C> {
    task: T,
    evaluator: E,
    open_list: O,
    pruning: P,
    clock: C,
    rng: Box<dyn RngCore>,
    search_space: SearchSpace<T::StateId, T::OperatorId>,
    statistics: SearchStatistics,
    reopen_closed: bool,
    bound: Cost,
    target_epsilon: f64,
    end_of_search_estimations: bool,
    ladder: SynchronicLadderConfig,
}

impl<T, E, O, P, C> SearchEngineContext<T> for SynchronicEngine<T, E, O, P, C>
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

impl<T, E, O, P, C> SynchronicEngine<T, E, O, P, C>
where
    T: Task,
    E: Evaluator<T>,
    O: OpenList<T>,
    P: PruningMethod<T>,
    C: Clock,
{
    /// `target_epsilon` is supplied by the caller (a one-shot run uses
    /// `cfg.epsilon`; the `IteratedSync` driver passes a shrinking value
    /// across iterations — see [`crate::drivers::iterated_sync`]).
    /// Mirrors [`super::beauty::BeautyEngine::into_parts`]: hands the task,
    /// evaluator, open list, pruning method, clock and RNG back to the
    /// caller, used by [`crate::drivers::iterated_sync`] to rebuild a fresh
    /// engine for the next iteration's (shrinking) `target_epsilon`.
    pub fn into_parts(self) -> (T, E, O, P, C, Box<dyn RngCore>) {
        (self.task, self.evaluator, self.open_list, self.pruning, self.clock, self.rng)
    }

    pub fn new(
        task: T,
        evaluator: E,
        open_list: O,
        mut pruning: P,
        clock: C,
        rng: Box<dyn RngCore>,
        cfg: &EngineConfig,
        target_epsilon: f64,
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
            clock,
            rng,
            search_space: SearchSpace::new(),
            statistics: SearchStatistics::new(),
            reopen_closed: cfg.reopen_closed,
            bound: cfg.bound,
            target_epsilon,
            end_of_search_estimations: cfg.end_of_search_estimations,
            ladder: cfg.synchronic_ladder,
        })
    }

    pub fn search(&mut self) -> SearchStatus<SynchronicResult<T::StateId, T::OperatorId>> {
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

    /// See [`super::beauty::BeautyEngine::revalidate_lazily`]: the same
    /// lazy-revalidation shape, against the synchronic engine's own
    /// statistics and open list.
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
        let stop_at_min_g = if is_new { None } else { Some(succ.min_g()) };
        synchronic_estimation_loop(
            &mut info,
            parent.min_g(),
            parent.max_g(),
            adjusted_cost,
            self.target_epsilon,
            stop_at_min_g,
            &self.ladder,
            &self.clock,
            self.rng.as_mut(),
            &mut self.statistics,
        );

        if is_new {
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

        if info.min_g < succ.min_g() {
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
    ) -> SynchronicResult<T::StateId, T::OperatorId> {
        let plan = self.search_space.trace_path(goal_id);
        let goal_node = self.search_space.node(goal_id);
        let real_g = goal_node.real_g();
        let mut uncertainty_ratio = if goal_node.min_g() > 0 {
            goal_node.max_g() as f64 / goal_node.min_g() as f64
        } else if goal_node.min_g() == goal_node.max_g() {
            1.0
        } else {
            goal_node.max_g() as f64 / goal_node.min_g().max(1) as f64
        };

        if uncertainty_ratio > self.target_epsilon && self.end_of_search_estimations {
            let mut current_id = goal_id.clone();
            'walk: loop {
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
                    let Some(step) = get_synchronic_step(
                        &mut info,
                        adjusted_cost,
                        &self.ladder,
                        self.rng.as_mut(),
                    ) else {
                        break;
                    };
                    step.estimate(&mut info, &self.clock);
                    info.min_g = add_cost(parent.min_g(), info.min_cost);
                    info.max_g = add_cost(parent.max_g(), info.max_cost);
                    self.statistics.inc_estimations(1);
                    match info.rank {
                        1 => self.statistics.inc_l1_estimations(1),
                        2 => self.statistics.inc_l2_estimations(1),
                        3 => self.statistics.inc_l3_estimations(1),
                        _ => {}
                    }
                    if !info.try_next {
                        break;
                    }
                }

                let mut current_mut = current;
                current_mut.set_estimation(info);
                self.search_space.store(current_mut);

                let goal_node = self.search_space.node(goal_id);
                uncertainty_ratio = if goal_node.min_g() > 0 {
                    goal_node.max_g() as f64 / goal_node.min_g() as f64
                } else {
                    1.0
                };
                if uncertainty_ratio <= self.target_epsilon {
                    break 'walk;
                }

                current_id = parent_id;
            }
        }

        let goal_node = self.search_space.node(goal_id);
        SynchronicResult {
            goal: goal_id.clone(),
            plan,
            real_g,
            min_g: goal_node.min_g(),
            max_g: goal_node.max_g(),
            uncertainty_ratio,
            solved_within_epsilon: uncertainty_ratio <= self.target_epsilon,
        }
    }
}

/// The Synchronic mode estimation loop: spend estimation effort until
/// the successor's uncertainty ratio falls to `target_epsilon`, the ladder is
/// exhausted, or (for re-encountered states) no further improvement over the
/// recorded bound is possible.
#[allow(clippy::too_many_arguments)]
fn synchronic_estimation_loop(
    info: &mut EstimationInfo,
    parent_min_g: Cost,
    parent_max_g: Cost,
    adjusted_cost: Cost,
    target_epsilon: f64,
    stop_at_min_g: Option<Cost>,
    ladder: &SynchronicLadderConfig,
    clock: &dyn Clock,
    rng: &mut dyn RngCore,
    stats: &mut SearchStatistics,
) {
    let mut eta = 1.0;
    loop {
        if let Some(threshold) = stop_at_min_g {
            if info.min_g >= threshold {
                break;
            }
        }
        let Some(step) = get_synchronic_step(info, adjusted_cost, ladder, rng) else {
            break;
        };
        step.estimate(info, clock);
        info.min_g = add_cost(parent_min_g, info.min_cost);
        info.max_g = add_cost(parent_max_g, info.max_cost);
        stats.inc_estimations(1);
        match info.rank {
            1 => stats.inc_l1_estimations(1),
            2 => stats.inc_l2_estimations(1),
            3 => stats.inc_l3_estimations(1),
            _ => {}
        }
        if step.bounds_ratio() > 1.0 {
            eta = if info.min_g > 0 {
                info.max_g as f64 / info.min_g as f64
            } else {
                1.0
            };
        }
        if eta <= target_epsilon {
            break;
        }
    }
}

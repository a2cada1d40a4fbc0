//! External collaborators: the planning task, cost adjustment, the evaluator
//! and open-list and pruning-method interfaces. These are consumed by the
//! engines in [`crate::engines`] but not designed here — the task model,
//! heuristic evaluators, open-list data structures and pruning plugins are
//! all host-provided.

use std::fmt::Debug;
use std::hash::Hash;

use crate::estimation_info::Cost;

/// A planning task: states, an applicable-operator generator, a goal
/// predicate, and operator costs.
pub trait Task {
    type StateId: Clone + Eq + Hash + Debug + PartialEq;
    type OperatorId: Clone + Eq + Debug + PartialEq;

    fn initial_state(&self) -> Self::StateId;
    fn is_goal(&self, state: &Self::StateId) -> bool;

    /// Applicable operators for `state`, before any pruning method runs.
    fn applicable_operators(&self, state: &Self::StateId) -> Vec<Self::OperatorId>;

    /// The operator's real (unadjusted) cost, accumulated into `real_g`.
    fn operator_cost(&self, op: &Self::OperatorId) -> Cost;

    /// The successor state reached by applying `op` to `state`.
    fn apply(&self, state: &Self::StateId, op: &Self::OperatorId) -> Self::StateId;

    /// The cost used wherever `g` (not `real_g`) is accumulated, per a
    /// host-chosen cost-transformation option. Defaults to the real cost.
    fn adjusted_cost(&self, op: &Self::OperatorId) -> Cost {
        self.operator_cost(op)
    }
}

/// The outcome of evaluating a state: `None` signals a dead end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationResult {
    pub value: Option<Cost>,
}

impl EvaluationResult {
    pub fn value(value: Cost) -> Self {
        Self { value: Some(value) }
    }

    pub fn dead_end() -> Self {
        Self { value: None }
    }

    pub fn is_dead_end(&self) -> bool {
        self.value.is_none()
    }
}

/// What an [`Evaluator`] sees when asked to evaluate a state.
pub struct EvalContext<'a, T: Task> {
    pub state: &'a T::StateId,
    pub g: Cost,
    pub estimation_info: Option<&'a crate::estimation_info::EstimationInfo>,
}

/// A heuristic evaluator. `caches_estimates` tells the engine whether a
/// cached value may be trusted without recomputation (a lazy, non-caching
/// evaluator is a configuration error, since a revalidation pass would have
/// nothing cached to compare its fresh estimate against).
pub trait Evaluator<T: Task> {
    fn compute_result(&mut self, ctx: &EvalContext<'_, T>) -> EvaluationResult;

    fn caches_estimates(&self) -> bool {
        false
    }

    /// Whether the engine should revalidate this evaluator's result against
    /// a freshly recomputed one when an open-list entry is popped, rather
    /// than trusting the value it was inserted with. A lazy evaluator that
    /// doesn't cache its estimates is a configuration error, since there
    /// would be nothing for the lazy pop to compare against.
    fn is_lazy(&self) -> bool {
        false
    }

    fn notify_initial_state(&mut self, _state: &T::StateId) {}

    fn notify_state_transition(&mut self, _parent: &T::StateId, _op: &T::OperatorId, _child: &T::StateId) {}
}

/// The baseline evaluator: surfaces a node's `min_g` as its value, the only
/// feedback loop by which estimation bounds enter open-list priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct EstimatedGEvaluator;

impl<T: Task> Evaluator<T> for EstimatedGEvaluator {
    fn compute_result(&mut self, ctx: &EvalContext<'_, T>) -> EvaluationResult {
        match ctx.estimation_info {
            Some(est) => EvaluationResult::value(est.min_g),
            None => EvaluationResult::value(ctx.g),
        }
    }

    fn caches_estimates(&self) -> bool {
        true
    }
}

/// An opaque priority queue over states, ordered by whatever priority the
/// engine computed for each (see [`EvalContext`]). The core guarantees it
/// never inserts a dead-end node and never re-closes a closed node without
/// going through `reopen`.
pub trait OpenList<T: Task> {
    fn insert(&mut self, ctx: &EvalContext<'_, T>, state: T::StateId);
    fn remove_min(&mut self) -> Option<T::StateId>;
    fn is_empty(&self) -> bool;
    fn is_dead_end(&self, ctx: &EvalContext<'_, T>) -> bool;
    fn clear(&mut self);
    fn boost_preferred(&mut self) {}
}

/// A pruning method consulted after generating applicable operators.
pub trait PruningMethod<T: Task> {
    fn initialize(&mut self, _task: &T) {}
    fn prune_operators(&mut self, _state: &T::StateId, _applicable: &mut Vec<T::OperatorId>) {}
    fn print_statistics(&self) {}
}

/// The trivial pruning method: no operator is ever pruned.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPruning;

impl<T: Task> PruningMethod<T> for NoPruning {}

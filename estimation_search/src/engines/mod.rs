//! Search-engine shared surface: goal check, cost adjustment, and plan
//! extraction, common to the Beauty and Synchronic engines and reused by the
//! iterated drivers built on top of them.

pub mod beauty;
pub mod synchronic;

use crate::estimation_info::Cost;
use crate::search_space::SearchSpace;
use crate::statistics::SearchStatistics;
use crate::task::Task;

/// Bundles the bits every engine needs regardless of mode: access to the
/// task, the search space it is building, the accumulated statistics, and
/// the host-configured bound on accumulated `real_g`.
pub trait SearchEngineContext<T: Task> {
    fn task(&self) -> &T;
    fn search_space(&self) -> &SearchSpace<T::StateId, T::OperatorId>;
    fn statistics(&self) -> &SearchStatistics;
    fn bound(&self) -> Cost;

    fn adjusted_cost(&self, op: &T::OperatorId) -> Cost {
        self.task().adjusted_cost(op)
    }

    fn is_goal(&self, state: &T::StateId) -> bool {
        self.task().is_goal(state)
    }

    fn trace_path(&self, goal: &T::StateId) -> Vec<T::OperatorId> {
        self.search_space().trace_path(goal)
    }
}

/// The outcome of a blocking `search()` call.
#[derive(Debug, Clone)]
pub enum SearchStatus<Result> {
    Solved(Result),
    Failed,
}

impl<Result> SearchStatus<Result> {
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchStatus::Solved(_))
    }
}

//! A concrete [`OpenList`] implementation keyed on the estimated-g
//! evaluator's value, built the way `generic_a_star`'s comparator wraps
//! `binary_heap_plus::BinaryHeap`: the heap is a max-heap, so the comparator
//! reverses the natural ordering to surface the smallest priority first.

use std::cmp::Ordering;

use binary_heap_plus::BinaryHeap;
use compare::Compare;

use crate::estimation_info::Cost;
use crate::task::{EvalContext, OpenList, Task};

#[derive(Debug, Default)]
struct PriorityComparator;

impl<StateId> Compare<(Cost, u64, StateId)> for PriorityComparator {
    fn compare(&self, l: &(Cost, u64, StateId), r: &(Cost, u64, StateId)) -> Ordering {
        (l.0, l.1).cmp(&(r.0, r.1)).reverse()
    }
}

/// Orders states by ascending evaluator value, breaking ties by insertion
/// order (FIFO).
pub struct EstimatedGOpenList<StateId> {
    heap: BinaryHeap<(Cost, u64, StateId), PriorityComparator>,
    next_sequence: u64,
}

impl<StateId> EstimatedGOpenList<StateId> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::from_vec_cmp(Vec::new(), PriorityComparator),
            next_sequence: 0,
        }
    }
}

impl<StateId> Default for EstimatedGOpenList<StateId> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Task> OpenList<T> for EstimatedGOpenList<T::StateId> {
    fn insert(&mut self, ctx: &EvalContext<'_, T>, state: T::StateId) {
        let priority = ctx
            .estimation_info
            .map(|est| est.min_g)
            .unwrap_or(ctx.g);
        self.next_sequence += 1;
        self.heap.push((priority, self.next_sequence, state));
    }

    fn remove_min(&mut self) -> Option<T::StateId> {
        self.heap.pop().map(|(_, _, state)| state)
    }

    fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn is_dead_end(&self, _ctx: &EvalContext<'_, T>) -> bool {
        false
    }

    fn clear(&mut self) {
        self.heap.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct DummyTask;

    impl Task for DummyTask {
        type StateId = u32;
        type OperatorId = u32;

        fn initial_state(&self) -> u32 {
            0
        }
        fn is_goal(&self, _state: &u32) -> bool {
            false
        }
        fn applicable_operators(&self, _state: &u32) -> Vec<u32> {
            vec![]
        }
        fn operator_cost(&self, _op: &u32) -> Cost {
            1
        }
        fn apply(&self, state: &u32, _op: &u32) -> u32 {
            *state
        }
    }

    fn ctx(dummy_state: &u32, g: Cost) -> EvalContext<'_, DummyTask> {
        EvalContext {
            state: dummy_state,
            g,
            estimation_info: None,
        }
    }

    #[test]
    fn pops_smallest_priority_first() {
        let dummy_state = 0u32;
        let mut open: EstimatedGOpenList<u32> = EstimatedGOpenList::new();
        open.insert(&ctx(&dummy_state, 5), 1);
        open.insert(&ctx(&dummy_state, 2), 2);
        open.insert(&ctx(&dummy_state, 9), 3);
        assert_eq!(open.remove_min(), Some(2));
        assert_eq!(open.remove_min(), Some(1));
        assert_eq!(open.remove_min(), Some(3));
        assert!(open.is_empty());
    }

    #[test]
    fn ties_break_fifo() {
        let dummy_state = 0u32;
        let mut open: EstimatedGOpenList<u32> = EstimatedGOpenList::new();
        open.insert(&ctx(&dummy_state, 4), 10);
        open.insert(&ctx(&dummy_state, 4), 20);
        assert_eq!(open.remove_min(), Some(10));
        assert_eq!(open.remove_min(), Some(20));
    }
}

//! Per-state search metadata: node lifecycle, parent and creating-operator
//! backlinks, and the currently-believed-cheapest incoming edge's
//! [`EstimationInfo`].
//!
//! The registry keys node metadata by state identity (`StateId -> NodeInfo`)
//! rather than holding live references into it, since the same state can be
//! reached along more than one path: [`SearchNode`] is a cheap owned
//! snapshot, not a borrowed handle, so an edge-expansion step can hold both
//! the parent's and the successor's node simultaneously without fighting the
//! borrow checker.

use std::hash::Hash;

use deterministic_default_hasher::DeterministicDefaultHasher;

use crate::estimation_info::{Cost, EstimationInfo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeStatus {
    New,
    Open,
    Closed,
    DeadEnd,
}

#[derive(Debug, Clone)]
pub struct SearchNodeInfo<StateId, OperatorId> {
    pub status: NodeStatus,
    pub g: Cost,
    pub real_g: Cost,
    pub parent_state_id: Option<StateId>,
    pub creating_operator: Option<OperatorId>,
    pub curr_estimation: EstimationInfo,
}

impl<StateId, OperatorId> Default for SearchNodeInfo<StateId, OperatorId> {
    fn default() -> Self {
        Self {
            status: NodeStatus::New,
            g: 0,
            real_g: 0,
            parent_state_id: None,
            creating_operator: None,
            curr_estimation: EstimationInfo::default(),
        }
    }
}

/// A thin handle pairing a state identity with its metadata. Every mutation
/// happens through this handle; [`SearchSpace::store`] writes it back.
#[derive(Debug, Clone)]
pub struct SearchNode<StateId, OperatorId> {
    state_id: StateId,
    info: SearchNodeInfo<StateId, OperatorId>,
}

impl<StateId: Clone + PartialEq, OperatorId: Clone + PartialEq> SearchNode<StateId, OperatorId> {
    pub fn state_id(&self) -> &StateId {
        &self.state_id
    }

    pub fn status(&self) -> NodeStatus {
        self.info.status
    }

    pub fn is_new(&self) -> bool {
        matches!(self.info.status, NodeStatus::New)
    }

    pub fn is_open(&self) -> bool {
        matches!(self.info.status, NodeStatus::Open)
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.info.status, NodeStatus::Closed)
    }

    pub fn is_dead_end(&self) -> bool {
        matches!(self.info.status, NodeStatus::DeadEnd)
    }

    pub fn g(&self) -> Cost {
        self.info.g
    }

    pub fn real_g(&self) -> Cost {
        self.info.real_g
    }

    pub fn min_g(&self) -> Cost {
        self.info.curr_estimation.min_g
    }

    pub fn max_g(&self) -> Cost {
        self.info.curr_estimation.max_g
    }

    pub fn estimation(&self) -> &EstimationInfo {
        &self.info.curr_estimation
    }

    pub fn parent_state_id(&self) -> Option<&StateId> {
        self.info.parent_state_id.as_ref()
    }

    pub fn creating_operator(&self) -> Option<&OperatorId> {
        self.info.creating_operator.as_ref()
    }

    /// True when this node's recorded incoming edge is exactly `(parent, op)`
    /// — used to skip re-estimating an already-known edge.
    pub fn is_same_edge(&self, parent: &SearchNode<StateId, OperatorId>, op: &OperatorId) -> bool {
        self.info.parent_state_id.as_ref() == Some(&parent.state_id)
            && self.info.creating_operator.as_ref() == Some(op)
    }

    pub fn open_initial(&mut self) {
        assert!(self.is_new(), "open_initial called on a non-new node");
        self.info.status = NodeStatus::Open;
        self.info.g = 0;
        self.info.real_g = 0;
        self.info.parent_state_id = None;
        self.info.creating_operator = None;
        self.info.curr_estimation = EstimationInfo::initial();
    }

    pub fn open(
        &mut self,
        parent: &SearchNode<StateId, OperatorId>,
        op: OperatorId,
        op_real_cost: Cost,
        adjusted_cost: Cost,
        est: &EstimationInfo,
    ) {
        assert!(self.is_new(), "open called on a non-new node");
        self.info.status = NodeStatus::Open;
        self.info.g = parent.g() + adjusted_cost;
        self.info.real_g = parent.real_g() + op_real_cost;
        self.info.parent_state_id = Some(parent.state_id.clone());
        self.info.creating_operator = Some(op);
        self.info.curr_estimation = *est;
    }

    /// OPEN|CLOSED -> OPEN. Caller must ensure `est.min_g` is strictly lower
    /// than the recorded one; this only replays the bookkeeping.
    pub fn reopen(
        &mut self,
        parent: &SearchNode<StateId, OperatorId>,
        op: OperatorId,
        op_real_cost: Cost,
        adjusted_cost: Cost,
        est: &EstimationInfo,
    ) {
        assert!(
            self.is_open() || self.is_closed(),
            "reopen called on a node that was never opened"
        );
        self.info.status = NodeStatus::Open;
        self.update_parent(parent, op, op_real_cost, adjusted_cost, est);
    }

    /// Identical to [`Self::reopen`] but leaves `status` untouched — used
    /// when the closed-node-reopen policy is disabled.
    pub fn update_parent(
        &mut self,
        parent: &SearchNode<StateId, OperatorId>,
        op: OperatorId,
        op_real_cost: Cost,
        adjusted_cost: Cost,
        est: &EstimationInfo,
    ) {
        assert!(
            self.is_open() || self.is_closed(),
            "update_parent called on a node that was never opened"
        );
        self.info.g = parent.g() + adjusted_cost;
        self.info.real_g = parent.real_g() + op_real_cost;
        self.info.parent_state_id = Some(parent.state_id.clone());
        self.info.creating_operator = Some(op);
        self.info.curr_estimation = *est;
    }

    pub fn close(&mut self) {
        assert!(self.is_open(), "close called on a node that isn't open");
        self.info.status = NodeStatus::Closed;
    }

    pub fn mark_as_dead_end(&mut self) {
        self.info.status = NodeStatus::DeadEnd;
    }

    /// Tightens this node's recorded estimation bounds in place, without
    /// touching its parent linkage or `g`/`real_g` — used by end-of-search
    /// refinement passes that keep pushing an already-recorded edge's ladder.
    pub fn set_estimation(&mut self, est: EstimationInfo) {
        self.info.curr_estimation = est;
    }
}

/// Owns the registry of per-state metadata, keyed by state identity.
pub struct SearchSpace<StateId, OperatorId> {
    nodes: std::collections::HashMap<StateId, SearchNodeInfo<StateId, OperatorId>, DeterministicDefaultHasher>,
}

impl<StateId, OperatorId> Default for SearchSpace<StateId, OperatorId> {
    fn default() -> Self {
        Self {
            nodes: std::collections::HashMap::with_hasher(DeterministicDefaultHasher::default()),
        }
    }
}

impl<StateId: Clone + Eq + Hash + PartialEq, OperatorId: Clone + PartialEq> SearchSpace<StateId, OperatorId> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot handle for `id`, implicitly creating its metadata
    /// (as [`NodeStatus::New`]) on first access.
    pub fn node(&self, id: &StateId) -> SearchNode<StateId, OperatorId> {
        SearchNode {
            state_id: id.clone(),
            info: self.nodes.get(id).cloned().unwrap_or_default(),
        }
    }

    pub fn status(&self, id: &StateId) -> NodeStatus {
        self.nodes
            .get(id)
            .map(|info| info.status)
            .unwrap_or(NodeStatus::New)
    }

    /// Writes a mutated handle back into the registry.
    pub fn store(&mut self, node: SearchNode<StateId, OperatorId>) {
        self.nodes.insert(node.state_id, node.info);
    }

    /// Rebuilds a fresh `EstimationInfo` for a re-encountered edge from the
    /// successor's stored per-edge bounds and the parent's current bounds, so
    /// further estimation resumes from the last saved rank.
    pub fn set_estimation_info_based_on_edge(
        &self,
        parent: &SearchNode<StateId, OperatorId>,
        succ: &SearchNode<StateId, OperatorId>,
    ) -> EstimationInfo {
        EstimationInfo::resume_from_edge(parent.min_g(), parent.max_g(), succ.estimation())
    }

    /// Walks the plan's parent links from `goal` back to the initial state,
    /// returning the applied operators in forward order.
    pub fn trace_path(&self, goal: &StateId) -> Vec<OperatorId> {
        let mut path = Vec::new();
        let mut current = goal.clone();
        loop {
            let info = self
                .nodes
                .get(&current)
                .expect("trace_path visited a state with no recorded metadata");
            match (&info.creating_operator, &info.parent_state_id) {
                (None, None) => break,
                (Some(op), Some(parent)) => {
                    path.push(op.clone());
                    current = parent.clone();
                }
                _ => unreachable!("a node has a creating operator iff it has a parent"),
            }
        }
        path.reverse();
        path
    }
}

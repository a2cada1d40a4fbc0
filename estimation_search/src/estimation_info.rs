//! Per-edge estimation carrier shared by an edge's estimator ladder.

/// Accumulated and per-edge costs. Modeled as a plain integer, with
/// [`Cost::MAX`] standing in for "unknown upper bound" the way the original
/// planner used `std::numeric_limits<int>::max()`.
pub type Cost = i64;

/// Sentinel for an unbounded-above interval endpoint.
pub const INFINITE: Cost = Cost::MAX;

/// Saturating sum, since driver loops chain bounds across iterations and an
/// add against [`INFINITE`] must stay representable rather than overflow.
pub fn add_cost(a: Cost, b: Cost) -> Cost {
    a.saturating_add(b)
}

/// Carrier shared by an edge's estimator ladder: bounds on the edge itself
/// (`min_cost`/`max_cost`) and on the accumulated cost to the child
/// (`min_g`/`max_g`), plus the ladder's progress (`rank`) and whether further,
/// more expensive estimators may still be solicited (`try_next`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EstimationInfo {
    pub min_g: Cost,
    pub max_g: Cost,
    pub min_cost: Cost,
    pub max_cost: Cost,
    pub rank: u32,
    pub try_next: bool,
}

impl Default for EstimationInfo {
    /// Default state for a freshly encountered edge.
    fn default() -> Self {
        Self {
            min_g: 0,
            max_g: INFINITE,
            min_cost: 0,
            max_cost: INFINITE,
            rank: 0,
            try_next: true,
        }
    }
}

impl EstimationInfo {
    /// The trivial carrier for the initial state: no edge led here.
    pub fn initial() -> Self {
        Self {
            min_g: 0,
            max_g: 0,
            min_cost: 0,
            max_cost: 0,
            rank: 0,
            try_next: false,
        }
    }

    /// Rebuilds an `EstimationInfo` for a re-encountered edge from the parent's
    /// current bounds and this edge's previously saved per-edge bounds and
    /// ladder position, so estimation can resume where it left off.
    pub fn resume_from_edge(parent_min_g: Cost, parent_max_g: Cost, edge: &EstimationInfo) -> Self {
        Self {
            min_g: add_cost(parent_min_g, edge.min_cost),
            max_g: add_cost(parent_max_g, edge.max_cost),
            min_cost: edge.min_cost,
            max_cost: edge.max_cost,
            rank: edge.rank,
            try_next: edge.try_next,
        }
    }

    /// `max_g / min_g`, or `1.0` when `min_g == 0` (no uncertainty expressed
    /// yet, treated as already tight rather than dividing by zero).
    pub fn uncertainty_ratio(&self) -> f64 {
        if self.min_g == 0 {
            1.0
        } else {
            self.max_g as f64 / self.min_g as f64
        }
    }
}

//! A small weighted DAG loaded from TOML, playing the role of a host-owned
//! planning task — the `Task` trait is implemented here just to give the
//! demo binary something to search over.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use estimation_search::Cost;
use estimation_search::Task;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GraphFile {
    pub initial: String,
    pub goal: String,
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EdgeSpec {
    pub from: String,
    pub to: String,
    pub operator: String,
    pub cost: Cost,
}

impl GraphFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading graph file {path:?}"))?;
        toml::from_str(&text).with_context(|| format!("parsing graph file {path:?}"))
    }
}

/// A weighted DAG task: states and operators are both plain strings, as read
/// from the graph file.
#[derive(Debug, Clone)]
pub struct DagTask {
    initial: String,
    goal: String,
    adjacency: HashMap<String, Vec<EdgeSpec>>,
}

impl DagTask {
    pub fn from_file(graph: GraphFile) -> Self {
        let mut adjacency: HashMap<String, Vec<EdgeSpec>> = HashMap::new();
        for edge in graph.edges {
            adjacency.entry(edge.from.clone()).or_default().push(edge);
        }
        Self {
            initial: graph.initial,
            goal: graph.goal,
            adjacency,
        }
    }
}

impl Task for DagTask {
    type StateId = String;
    type OperatorId = String;

    fn initial_state(&self) -> Self::StateId {
        self.initial.clone()
    }

    fn is_goal(&self, state: &Self::StateId) -> bool {
        *state == self.goal
    }

    fn applicable_operators(&self, state: &Self::StateId) -> Vec<Self::OperatorId> {
        self.adjacency
            .get(state)
            .map(|edges| edges.iter().map(|edge| edge.operator.clone()).collect())
            .unwrap_or_default()
    }

    fn operator_cost(&self, op: &Self::OperatorId) -> Cost {
        self.adjacency
            .values()
            .flatten()
            .find(|edge| &edge.operator == op)
            .map(|edge| edge.cost)
            .expect("operator must have been produced by applicable_operators")
    }

    fn apply(&self, state: &Self::StateId, op: &Self::OperatorId) -> Self::StateId {
        self.adjacency[state]
            .iter()
            .find(|edge| &edge.operator == op)
            .map(|edge| edge.to.clone())
            .expect("operator must be applicable to state")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_graph() {
        let text = r#"
            initial = "a"
            goal = "c"

            [[edges]]
            from = "a"
            to = "b"
            operator = "ab"
            cost = 3

            [[edges]]
            from = "b"
            to = "c"
            operator = "bc"
            cost = 4
        "#;
        let graph: GraphFile = toml::from_str(text).unwrap();
        let task = DagTask::from_file(graph);
        assert_eq!(task.initial_state(), "a");
        assert!(!task.is_goal(&"a".to_string()));
        assert!(task.is_goal(&"c".to_string()));
        assert_eq!(task.applicable_operators(&"a".to_string()), vec!["ab".to_string()]);
        assert_eq!(task.apply(&"a".to_string(), &"ab".to_string()), "b");
    }
}

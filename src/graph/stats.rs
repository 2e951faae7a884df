//! Aggregate statistics over an assembled solution graph.

use petgraph::algo::connected_components;
use petgraph::Direction;
use serde::Serialize;
use std::collections::BTreeMap;

use super::{EdgeCategory, NodeKind, SolutionGraph};

/// One entry in a most-referenced / most-referencing ranking.
#[derive(Debug, Clone, Serialize)]
pub struct NodeRank {
    pub id: String,
    pub name: Option<String>,
    pub count: usize,
}

/// Derived statistics. Edge-level counts are post-collapse: two distinct
/// relationship types between the same ordered pair count once.
#[derive(Debug, Clone, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub form_count: usize,
    pub workflow_count: usize,
    pub task_type_count: usize,
    pub total_edges: usize,
    pub action_edges: usize,
    pub field_edges: usize,
    pub edge_types: BTreeMap<String, usize>,
    pub isolated_nodes: usize,
    pub connected_components: usize,
    pub most_referenced: Vec<NodeRank>,
    pub most_referencing: Vec<NodeRank>,
}

impl SolutionGraph {
    /// Compute statistics for the current graph.
    pub fn stats(&self) -> GraphStats {
        let mut form_count = 0;
        let mut workflow_count = 0;
        let mut task_type_count = 0;
        for node in self.graph.node_weights() {
            match node.node_type {
                Some(NodeKind::Form) => form_count += 1,
                Some(NodeKind::Workflow) => workflow_count += 1,
                Some(NodeKind::TaskType) => task_type_count += 1,
                None => {}
            }
        }

        let mut edge_types: BTreeMap<String, usize> = BTreeMap::new();
        let mut action_edges = 0;
        let mut field_edges = 0;
        for attrs in self.graph.edge_weights() {
            *edge_types
                .entry(attrs.relationship_type.as_str().to_string())
                .or_insert(0) += 1;
            match attrs.edge_category {
                EdgeCategory::Action => action_edges += 1,
                EdgeCategory::Field => field_edges += 1,
            }
        }

        let isolated_nodes = self
            .graph
            .node_indices()
            .filter(|&index| {
                self.graph
                    .neighbors_undirected(index)
                    .next()
                    .is_none()
            })
            .count();

        GraphStats {
            total_nodes: self.graph.node_count(),
            form_count,
            workflow_count,
            task_type_count,
            total_edges: self.graph.edge_count(),
            action_edges,
            field_edges,
            edge_types,
            isolated_nodes,
            // Direction is ignored here, so this is the weak component count.
            connected_components: connected_components(&self.graph),
            most_referenced: self.rank_by_degree(Direction::Incoming),
            most_referencing: self.rank_by_degree(Direction::Outgoing),
        }
    }

    /// Top 5 nodes by degree in one direction, zero-degree entries dropped.
    /// Ties keep node insertion order (stable sort).
    fn rank_by_degree(&self, direction: Direction) -> Vec<NodeRank> {
        let mut degrees: Vec<_> = self
            .graph
            .node_indices()
            .map(|index| {
                let count = self.graph.edges_directed(index, direction).count();
                (index, count)
            })
            .collect();
        degrees.sort_by(|a, b| b.1.cmp(&a.1));
        degrees
            .into_iter()
            .take(5)
            .filter(|(_, count)| *count > 0)
            .map(|(index, count)| {
                let node = &self.graph[index];
                NodeRank {
                    id: node.id.clone(),
                    name: node.name.clone(),
                    count,
                }
            })
            .collect()
    }
}

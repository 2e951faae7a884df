//! Directed solution graph: nodes are entities, edges are relationships.
//!
//! Rebuilt from scratch on every run; nothing is persisted. Edge identity
//! is the ordered (source, target) pair, so a later relationship between
//! the same pair overwrites the earlier edge's attributes. Callers that
//! need per-relationship fidelity work from the relationship list.

mod stats;

pub use stats::{GraphStats, NodeRank};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::analyzer::{Relationship, RelationshipType, TargetType};
use crate::model::{EntityDefinition, FormDefinition, TaskTypeDefinition, WorkflowDefinition};

/// Node classification. Implicitly created edge endpoints (templates,
/// plans, entities never fetched) carry no kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NodeKind {
    #[serde(rename = "form")]
    Form,
    #[serde(rename = "workflow")]
    Workflow,
    #[serde(rename = "task_type")]
    TaskType,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Workflow => "workflow",
            Self::TaskType => "task_type",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether an edge came from a field configuration or a custom action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EdgeCategory {
    #[serde(rename = "action")]
    Action,
    #[serde(rename = "field")]
    Field,
}

/// Node payload: display name plus provenance attributes.
#[derive(Debug, Clone, Serialize)]
pub struct SolutionNode {
    pub id: String,
    pub name: Option<String>,
    pub node_type: Option<NodeKind>,
    pub external: bool,
    pub container_id: Option<String>,
}

impl SolutionNode {
    /// Display name, falling back to the id for implicit endpoints.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }
}

/// Edge payload: the surviving relationship's descriptive attributes.
#[derive(Debug, Clone, Serialize)]
pub struct EdgeAttrs {
    pub relationship_type: RelationshipType,
    pub field_name: Option<String>,
    pub target_type: TargetType,
    pub edge_category: EdgeCategory,
    pub action_id: Option<String>,
    pub action_name: Option<String>,
    pub trigger_type: Option<String>,
    pub automatic: Option<bool>,
    pub is_subform: Option<bool>,
}

impl EdgeAttrs {
    fn from_relationship(rel: &Relationship) -> Self {
        let edge_category = if rel.action_id.is_some() {
            EdgeCategory::Action
        } else {
            EdgeCategory::Field
        };
        Self {
            relationship_type: rel.relationship_type,
            field_name: rel.field_name.clone(),
            target_type: rel.target_type,
            edge_category,
            action_id: rel.action_id.clone(),
            action_name: rel.action_name.clone(),
            trigger_type: rel.trigger_type.clone(),
            automatic: rel.automatic,
            is_subform: rel.is_subform,
        }
    }
}

/// One adjacent node in a neighbor lookup.
#[derive(Debug, Clone, Serialize)]
pub struct NeighborEntry {
    pub id: String,
    pub name: Option<String>,
    pub relationship: RelationshipType,
    pub field: Option<String>,
}

/// A node together with who points at it and what it points at.
#[derive(Debug, Clone, Serialize)]
pub struct NodeNeighbors {
    pub id: String,
    pub name: Option<String>,
    pub node_type: Option<NodeKind>,
    pub referenced_by: Vec<NeighborEntry>,
    pub references: Vec<NeighborEntry>,
}

/// The assembled graph, with a string-id index over petgraph storage.
#[derive(Debug)]
pub struct SolutionGraph {
    pub(crate) graph: DiGraph<SolutionNode, EdgeAttrs>,
    pub(crate) id_index: HashMap<String, NodeIndex>,
}

impl Default for SolutionGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SolutionGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Insert a node, replacing the payload if the id is already present.
    fn upsert_node(&mut self, node: SolutionNode) -> NodeIndex {
        if let Some(&index) = self.id_index.get(&node.id) {
            self.graph[index] = node;
            index
        } else {
            let id = node.id.clone();
            let index = self.graph.add_node(node);
            self.id_index.insert(id, index);
            index
        }
    }

    /// Resolve an edge endpoint, creating a bare placeholder node for ids
    /// that were never added explicitly (templates, plans, unfetched
    /// entities).
    fn ensure_endpoint(&mut self, id: &str) -> NodeIndex {
        if let Some(&index) = self.id_index.get(id) {
            return index;
        }
        self.upsert_node(SolutionNode {
            id: id.to_string(),
            name: None,
            node_type: None,
            external: false,
            container_id: None,
        })
    }

    /// Add or overwrite the directed edge for one relationship.
    fn apply_relationship(&mut self, rel: &Relationship) {
        let source = self.ensure_endpoint(&rel.source_id);
        let target = self.ensure_endpoint(&rel.target_id);
        self.graph
            .update_edge(source, target, EdgeAttrs::from_relationship(rel));
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.id_index.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&SolutionNode> {
        let index = self.id_index.get(id)?;
        self.graph.node_weight(*index)
    }

    /// All nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &SolutionNode> {
        self.graph.node_weights()
    }

    /// All edges as (source node, target node, attributes).
    pub fn edges(&self) -> impl Iterator<Item = (&SolutionNode, &SolutionNode, &EdgeAttrs)> {
        use petgraph::visit::EdgeRef;
        self.graph.edge_references().map(|edge| {
            (
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    /// Ids this node points at, resolved to display names where known.
    pub fn successor_names(&self, id: &str, limit: usize) -> Vec<String> {
        self.adjacent_names(id, Direction::Outgoing, limit)
    }

    /// Ids pointing at this node, resolved to display names where known.
    pub fn predecessor_names(&self, id: &str, limit: usize) -> Vec<String> {
        self.adjacent_names(id, Direction::Incoming, limit)
    }

    fn adjacent_names(&self, id: &str, direction: Direction, limit: usize) -> Vec<String> {
        let Some(&index) = self.id_index.get(id) else {
            return Vec::new();
        };
        self.graph
            .neighbors_directed(index, direction)
            .take(limit)
            .map(|n| self.graph[n].display_name().to_string())
            .collect()
    }

    /// A node's connections, or `None` when the id is not in the graph.
    pub fn neighbors(&self, id: &str) -> Option<NodeNeighbors> {
        use petgraph::visit::EdgeRef;
        let &index = self.id_index.get(id)?;
        let node = &self.graph[index];

        let mut referenced_by = Vec::new();
        for edge in self.graph.edges_directed(index, Direction::Incoming) {
            let pred = &self.graph[edge.source()];
            referenced_by.push(NeighborEntry {
                id: pred.id.clone(),
                name: pred.name.clone(),
                relationship: edge.weight().relationship_type,
                field: edge.weight().field_name.clone(),
            });
        }

        let mut references = Vec::new();
        for edge in self.graph.edges_directed(index, Direction::Outgoing) {
            let succ = &self.graph[edge.target()];
            references.push(NeighborEntry {
                id: succ.id.clone(),
                name: succ.name.clone(),
                relationship: edge.weight().relationship_type,
                field: edge.weight().field_name.clone(),
            });
        }

        Some(NodeNeighbors {
            id: node.id.clone(),
            name: node.name.clone(),
            node_type: node.node_type,
            referenced_by,
            references,
        })
    }
}

/// Assemble the directed graph from entity lists and the relationship set.
///
/// Forms and workflows fall back to their secondary id field; task types
/// are keyed by their category id. A node's container id is its own when
/// present, else the ambient solution container (task types read theirs
/// from the nested container object instead).
pub fn build_graph(
    forms: &[FormDefinition],
    workflows: &[WorkflowDefinition],
    relationships: &[Relationship],
    task_types: &[TaskTypeDefinition],
    solution_container_id: Option<&str>,
) -> SolutionGraph {
    let mut graph = SolutionGraph::new();

    for form in forms {
        let Some(id) = form.entity_id() else { continue };
        let container_id = form
            .container_id
            .clone()
            .or_else(|| solution_container_id.map(str::to_string));
        graph.upsert_node(SolutionNode {
            id: id.to_string(),
            name: Some(form.entity_name().to_string()),
            node_type: Some(NodeKind::Form),
            external: form.external,
            container_id,
        });
    }

    for workflow in workflows {
        let Some(id) = workflow.entity_id() else { continue };
        let container_id = workflow
            .container_id
            .clone()
            .or_else(|| solution_container_id.map(str::to_string));
        graph.upsert_node(SolutionNode {
            id: id.to_string(),
            name: Some(workflow.display_name().to_string()),
            node_type: Some(NodeKind::Workflow),
            external: false,
            container_id,
        });
    }

    for task_type in task_types {
        let Some(id) = task_type.entity_id() else { continue };
        let container_id = task_type
            .container
            .as_ref()
            .and_then(|c| c.id.clone());
        graph.upsert_node(SolutionNode {
            id: id.to_string(),
            name: Some(task_type.display_name().to_string()),
            node_type: Some(NodeKind::TaskType),
            external: task_type.external,
            container_id,
        });
    }

    for rel in relationships {
        graph.apply_relationship(rel);
    }

    graph
}

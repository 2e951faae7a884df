//! Mermaid flowchart export.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::graph::{NodeKind, SolutionGraph};

/// Render the graph as a `graph TD` flowchart. Node shape encodes the
/// entity kind: workflows as subprocesses, task types as stadiums,
/// everything else as rectangles.
pub fn render_mermaid(graph: &SolutionGraph) -> String {
    let mut lines = vec!["graph TD".to_string()];

    for node in graph.nodes() {
        let (open, close) = match node.node_type {
            Some(NodeKind::Workflow) => ("[[", "]]"),
            Some(NodeKind::TaskType) => ("([", "])"),
            _ => ("[", "]"),
        };
        let label = node.display_name().replace('"', "'");
        lines.push(format!(
            "    {id}{open}\"{label}\"{close}",
            id = sanitize_id(&node.id),
            open = open,
            label = label,
            close = close,
        ));
    }

    for (source, target, attrs) in graph.edges() {
        lines.push(format!(
            "    {} -->|{}| {}",
            sanitize_id(&source.id),
            attrs.relationship_type,
            sanitize_id(&target.id),
        ));
    }

    lines.join("\n")
}

/// Mermaid identifiers cannot carry arbitrary punctuation.
fn sanitize_id(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Write the flowchart to a `.mmd` file, creating parent directories.
pub fn export_mermaid(graph: &SolutionGraph, output_path: &Path) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, render_mermaid(graph))?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_solution;
    use crate::graph::build_graph;
    use crate::model::{FormDefinition, TaskTypeDefinition, WorkflowDefinition};
    use serde_json::json;

    #[test]
    fn test_render_shapes_and_edges() {
        let forms = vec![
            FormDefinition::from_value(json!({
                "id": "1", "name": "Intake",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2"}
                }
            })),
            FormDefinition::from_value(json!({"id": "2", "name": "Parent \"A\""})),
        ];
        let workflows = vec![WorkflowDefinition::from_value(
            json!({"id": "500", "name": "Kickoff"}),
        )];
        let task_types = vec![TaskTypeDefinition::from_value(
            json!({"categoryId": "77", "name": "Inspection"}),
        )];
        let rels = analyze_solution(&forms, None, None);
        let graph = build_graph(&forms, &workflows, &rels, &task_types, None);

        let rendered = render_mermaid(&graph);
        assert!(rendered.starts_with("graph TD"));
        assert!(rendered.contains("    1[\"Intake\"]"));
        // Quotes in labels are swapped for single quotes.
        assert!(rendered.contains("    2[\"Parent 'A'\"]"));
        assert!(rendered.contains("    500[[\"Kickoff\"]]"));
        assert!(rendered.contains("    77([\"Inspection\"])"));
        assert!(rendered.contains("    1 -->|REFERENCE| 2"));
    }

    #[test]
    fn test_sanitize_id() {
        assert_eq!(sanitize_id("form-12.3"), "form_12_3");
        assert_eq!(sanitize_id("42"), "42");
    }

    #[test]
    fn test_export_writes_file() {
        let graph = build_graph(&[], &[], &[], &[], None);
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("diagram.mmd");
        export_mermaid(&graph, &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "graph TD");
    }
}

//! JSON export of the full solution map.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::analyzer::Relationship;
use crate::error::Result;
use crate::graph::GraphStats;
use crate::model::{EntityDefinition, FormDefinition, TaskTypeDefinition, WorkflowDefinition};

#[derive(Debug, Serialize)]
pub struct FormSummary {
    pub id: String,
    pub name: String,
    pub external: bool,
}

#[derive(Debug, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TaskTypeSummary {
    pub id: String,
    pub name: String,
    pub external: bool,
}

/// Export payload: slimmed entity lists plus the full relationship set
/// and statistics.
#[derive(Debug, Serialize)]
pub struct SolutionExport {
    pub container_id: String,
    pub generated_at: DateTime<Utc>,
    pub forms: Vec<FormSummary>,
    pub workflows: Vec<WorkflowSummary>,
    pub task_types: Vec<TaskTypeSummary>,
    pub relationships: Vec<Relationship>,
    pub statistics: GraphStats,
}

/// Assemble the export structure. Entities without any id are dropped,
/// matching the graph's node rules.
pub fn build_export(
    container_id: &str,
    forms: &[FormDefinition],
    workflows: &[WorkflowDefinition],
    task_types: &[TaskTypeDefinition],
    relationships: &[Relationship],
    statistics: GraphStats,
) -> SolutionExport {
    SolutionExport {
        container_id: container_id.to_string(),
        generated_at: Utc::now(),
        forms: forms
            .iter()
            .filter_map(|f| {
                Some(FormSummary {
                    id: f.entity_id()?.to_string(),
                    name: f.entity_name().to_string(),
                    external: f.external,
                })
            })
            .collect(),
        workflows: workflows
            .iter()
            .filter_map(|w| {
                Some(WorkflowSummary {
                    id: w.entity_id()?.to_string(),
                    name: w.display_name().to_string(),
                })
            })
            .collect(),
        task_types: task_types
            .iter()
            .filter_map(|t| {
                Some(TaskTypeSummary {
                    id: t.entity_id()?.to_string(),
                    name: t.display_name().to_string(),
                    external: t.external,
                })
            })
            .collect(),
        relationships: relationships.to_vec(),
        statistics,
    }
}

/// Write the export as pretty-printed JSON, creating parent directories.
pub fn export_json(export: &SolutionExport, output_path: &Path) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, serde_json::to_string_pretty(export)?)?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_solution;
    use crate::graph::build_graph;
    use serde_json::json;
    use tempfile::TempDir;

    fn sample_export() -> SolutionExport {
        let forms = vec![
            FormDefinition::from_value(json!({
                "id": "1", "name": "Intake",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2"}
                }
            })),
            FormDefinition::from_value(json!({"id": "2", "name": "Parent Form"})),
            FormDefinition::from_value(json!({"name": "No Id"})),
        ];
        let workflows = vec![WorkflowDefinition::from_value(json!({"id": "500"}))];
        let relationships = analyze_solution(&forms, None, None);
        let graph = build_graph(&forms, &workflows, &relationships, &[], Some("room-1"));
        build_export("room-1", &forms, &workflows, &[], &relationships, graph.stats())
    }

    #[test]
    fn test_build_export_slims_entities() {
        let export = sample_export();
        assert_eq!(export.container_id, "room-1");
        // The id-less form is dropped.
        assert_eq!(export.forms.len(), 2);
        assert_eq!(export.workflows.len(), 1);
        assert_eq!(export.workflows[0].name, "Unknown");
        assert_eq!(export.relationships.len(), 1);
        assert_eq!(export.statistics.total_edges, 1);
    }

    #[test]
    fn test_export_json_writes_file() {
        let export = sample_export();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("solution.json");
        let written = export_json(&export, &path).unwrap();
        assert!(written.exists());

        let raw = std::fs::read_to_string(&written).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["container_id"], "room-1");
        assert_eq!(value["relationships"][0]["relationship_type"], "REFERENCE");
        assert_eq!(value["relationships"][0]["target_type"], "form");
        assert!(value["relationships"][0]["action_id"].is_null());
    }
}

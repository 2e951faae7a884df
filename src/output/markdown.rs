//! Markdown summary: AI prompt construction and the non-AI fallback.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::graph::{EdgeCategory, GraphStats, SolutionGraph};
use crate::model::{EntityDefinition, FormDefinition, WorkflowDefinition};

const MAX_FORM_DETAILS: usize = 30;
const MAX_ACTION_DETAILS: usize = 20;
const MAX_NEIGHBOR_NAMES: usize = 3;

/// Build the prompt for the AI summary: solution data followed by an
/// instruction scaffold. Deterministic for a given graph.
pub fn generate_summary_prompt(
    container_id: &str,
    forms: &[FormDefinition],
    workflows: &[WorkflowDefinition],
    stats: &GraphStats,
    graph: &SolutionGraph,
) -> String {
    let mut form_details = Vec::new();
    for form in forms {
        let Some(id) = form.entity_id() else { continue };
        let mut detail = format!("- {}", form.entity_name());
        let refs_out = graph.successor_names(id, MAX_NEIGHBOR_NAMES);
        if !refs_out.is_empty() {
            detail.push_str(&format!(" -> references: {}", refs_out.join(", ")));
        }
        let refs_in = graph.predecessor_names(id, MAX_NEIGHBOR_NAMES);
        if !refs_in.is_empty() {
            detail.push_str(&format!(" <- referenced by: {}", refs_in.join(", ")));
        }
        form_details.push(detail);
    }
    let more_forms = if form_details.len() > MAX_FORM_DETAILS {
        "\n... and more"
    } else {
        ""
    };
    form_details.truncate(MAX_FORM_DETAILS);

    let workflow_names: Vec<String> = workflows
        .iter()
        .map(|w| format!("- {}", w.display_name()))
        .collect();

    let mut action_details = Vec::new();
    for (source, target, attrs) in graph.edges() {
        if attrs.edge_category != EdgeCategory::Action {
            continue;
        }
        action_details.push(format!(
            "- {}: {} -> {} (trigger: {}, type: {})",
            attrs.action_name.as_deref().unwrap_or("Unknown action"),
            source.display_name(),
            target.display_name(),
            attrs.trigger_type.as_deref().unwrap_or("Unknown"),
            attrs.relationship_type,
        ));
    }
    let more_actions = if action_details.len() > MAX_ACTION_DETAILS {
        "\n... and more"
    } else {
        ""
    };
    action_details.truncate(MAX_ACTION_DETAILS);
    let actions_block = if action_details.is_empty() {
        "No custom actions found".to_string()
    } else {
        action_details.join("\n")
    };

    let most_referenced: Vec<String> = stats
        .most_referenced
        .iter()
        .map(|r| {
            format!(
                "- {} ({} references)",
                r.name.as_deref().unwrap_or(&r.id),
                r.count
            )
        })
        .collect();

    format!(
        r#"Analyze this solution and write a clear, professional markdown summary.
The primary goal is to help the user understand how this solution works and how its components interact.

## Solution Data

**Container ID:** {container_id}

**Statistics:**
- Forms: {form_count}
- Workflows: {workflow_count}
- Task types: {task_type_count}
- Total Relationships: {total_edges}
- Action-based relationships: {action_edges}
- Field-based relationships: {field_edges}
- Connected components: {components}

**Forms and their relationships:**
{form_details}{more_forms}

**Workflows:**
{workflow_names}

**Custom Actions (automations that connect forms):**
{actions_block}{more_actions}

**Most referenced forms (central to the solution):**
{most_referenced}

## Instructions

Write a markdown document that helps the user understand this solution. Focus on clarity and practical understanding.

**Required sections (in order of importance):**

1. **Overview** - What is this solution for? Infer the business purpose from form and workflow names. Be specific about what problems it solves.

2. **Core Components** - Identify the central forms that anchor this solution. Explain what role each key form plays in the overall workflow.

3. **How It Works** - Describe the data flow through the solution:
   - How do forms connect to each other?
   - What triggers create new entries or update data?
   - How do workflows orchestrate the process?

4. **Automations & Actions** - Explain the important custom actions:
   - What do they do?
   - When do they trigger?
   - How do they connect different parts of the solution?

5. **Supporting Components** - List any utility forms, reporting forms, or secondary components.

6. **Notes** (optional, brief) - Any observations about potential improvements or notable patterns, but keep this short.

**Guidelines:**
- Prioritize helping the user understand what this solution DOES over analyzing its structure
- Use plain language, not technical jargon
- Be concise - bullet points are preferred
- Focus on the "why" and "how" of the solution
- Custom actions are important - they show how the solution automates work"#,
        container_id = container_id,
        form_count = stats.form_count,
        workflow_count = stats.workflow_count,
        task_type_count = stats.task_type_count,
        total_edges = stats.total_edges,
        action_edges = stats.action_edges,
        field_edges = stats.field_edges,
        components = stats.connected_components,
        form_details = form_details.join("\n"),
        more_forms = more_forms,
        workflow_names = workflow_names.join("\n"),
        actions_block = actions_block,
        more_actions = more_actions,
        most_referenced = most_referenced.join("\n"),
    )
}

/// Plain markdown summary used when no AI summarizer is configured.
pub fn generate_basic_markdown(
    container_id: &str,
    forms: &[FormDefinition],
    workflows: &[WorkflowDefinition],
    stats: &GraphStats,
) -> String {
    let mut lines = vec![
        "# Solution Map".to_string(),
        String::new(),
        format!("**Container ID:** {}", container_id),
        String::new(),
        "## Statistics".to_string(),
        String::new(),
        format!("- **Forms:** {}", stats.form_count),
        format!("- **Workflows:** {}", stats.workflow_count),
        format!("- **Task Types:** {}", stats.task_type_count),
        format!("- **Relationships:** {}", stats.total_edges),
        format!("- **Connected Components:** {}", stats.connected_components),
        format!("- **Isolated Nodes:** {}", stats.isolated_nodes),
        String::new(),
        "## Forms".to_string(),
        String::new(),
    ];

    for form in forms {
        lines.push(format!("- {}", form.entity_name()));
    }

    lines.push(String::new());
    lines.push("## Workflows".to_string());
    lines.push(String::new());
    for workflow in workflows {
        lines.push(format!("- {}", workflow.display_name()));
    }

    if !stats.most_referenced.is_empty() {
        lines.push(String::new());
        lines.push("## Most Referenced Forms".to_string());
        lines.push(String::new());
        for rank in &stats.most_referenced {
            lines.push(format!(
                "- {} ({} references)",
                rank.name.as_deref().unwrap_or(&rank.id),
                rank.count
            ));
        }
    }

    lines.join("\n")
}

/// Write a markdown document, creating parent directories.
pub fn export_markdown(content: &str, output_path: &Path) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, content)?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::{analyze_solution, ActionMap};
    use crate::graph::build_graph;
    use crate::model::ActionDefinition;
    use serde_json::json;

    fn sample() -> (Vec<FormDefinition>, Vec<WorkflowDefinition>, SolutionGraph) {
        let forms = vec![
            FormDefinition::from_value(json!({
                "id": "1", "name": "Intake",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2"}
                }
            })),
            FormDefinition::from_value(json!({"id": "2", "name": "Parent Form"})),
        ];
        let workflows = vec![WorkflowDefinition::from_value(
            json!({"id": "500", "name": "Kickoff"}),
        )];
        let mut actions = ActionMap::new();
        actions.insert(
            "1".to_string(),
            vec![ActionDefinition::from_value(json!({
                "id": "a1", "name": "Escalate", "triggerType": "ON_SUBMIT",
                "parameters": {"targetObjectType": 9, "targetProcess": "500"}
            }))],
        );
        let relationships = analyze_solution(&forms, Some(&actions), None);
        let graph = build_graph(&forms, &workflows, &relationships, &[], Some("room-1"));
        (forms, workflows, graph)
    }

    #[test]
    fn test_prompt_contains_solution_data() {
        let (forms, workflows, graph) = sample();
        let stats = graph.stats();
        let prompt = generate_summary_prompt("room-1", &forms, &workflows, &stats, &graph);
        assert!(prompt.contains("**Container ID:** room-1"));
        assert!(prompt.contains("- Forms: 2"));
        assert!(prompt.contains("references: Parent Form"));
        assert!(prompt.contains("referenced by: Intake"));
        assert!(prompt.contains("- Escalate: Intake -> Kickoff"));
        assert!(prompt.contains("trigger: ON_SUBMIT"));
        assert!(prompt.contains("## Instructions"));
    }

    #[test]
    fn test_prompt_without_actions() {
        let forms = vec![FormDefinition::from_value(json!({"id": "1", "name": "Solo"}))];
        let graph = build_graph(&forms, &[], &[], &[], None);
        let stats = graph.stats();
        let prompt = generate_summary_prompt("room-1", &forms, &[], &stats, &graph);
        assert!(prompt.contains("No custom actions found"));
    }

    #[test]
    fn test_basic_markdown_structure() {
        let (forms, workflows, graph) = sample();
        let stats = graph.stats();
        let md = generate_basic_markdown("room-1", &forms, &workflows, &stats);
        assert!(md.starts_with("# Solution Map"));
        assert!(md.contains("- **Forms:** 2"));
        assert!(md.contains("- Intake"));
        assert!(md.contains("- Kickoff"));
        assert!(md.contains("## Most Referenced Forms"));
    }

    #[test]
    fn test_export_markdown_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out").join("summary.md");
        export_markdown("# Hello", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# Hello");
    }
}

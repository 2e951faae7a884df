//! Interactive HTML graph export (vis-network).

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::graph::SolutionGraph;

#[derive(Debug, Serialize)]
struct VisNode {
    id: String,
    label: String,
    title: String,
    group: String,
}

#[derive(Debug, Serialize)]
struct VisEdge {
    from: String,
    to: String,
    label: String,
    arrows: &'static str,
}

/// Render a self-contained HTML page with the graph embedded as
/// vis-network data.
pub fn render_html(graph: &SolutionGraph, title: &str) -> Result<String> {
    let nodes: Vec<VisNode> = graph
        .nodes()
        .map(|node| {
            let kind = node
                .node_type
                .map(|k| k.as_str().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            let group = if node.external {
                format!("external_{}", kind)
            } else {
                kind.clone()
            };
            let title = match &node.container_id {
                Some(container) => format!("{} (container {})", kind, container),
                None => kind,
            };
            VisNode {
                id: node.id.clone(),
                label: node.display_name().to_string(),
                title,
                group,
            }
        })
        .collect();

    let edges: Vec<VisEdge> = graph
        .edges()
        .map(|(source, target, attrs)| VisEdge {
            from: source.id.clone(),
            to: target.id.clone(),
            label: attrs.relationship_type.as_str().to_string(),
            arrows: "to",
        })
        .collect();

    let nodes_json = serde_json::to_string(&nodes)?;
    let edges_json = serde_json::to_string(&edges)?;
    let safe_title = title.replace('<', "&lt;").replace('>', "&gt;");

    Ok(format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <title>{title}</title>
    <script src="https://unpkg.com/vis-network/standalone/umd/vis-network.min.js"></script>
    <style>
        body {{ margin: 0; padding: 0; font-family: sans-serif; }}
        #graph {{ width: 100vw; height: 100vh; }}
        .info {{
            position: absolute;
            top: 10px;
            left: 10px;
            background: rgba(255,255,255,0.9);
            padding: 10px;
            border-radius: 4px;
            box-shadow: 0 2px 4px rgba(0,0,0,0.2);
            z-index: 1000;
        }}
    </style>
</head>
<body>
    <div class="info">
        <strong>{title}</strong><br>
        Nodes: {node_count} | Edges: {edge_count}
    </div>
    <div id="graph"></div>
    <script>
        const nodes = new vis.DataSet({nodes_json});
        const edges = new vis.DataSet({edges_json});

        const container = document.getElementById('graph');
        const data = {{ nodes, edges }};
        const options = {{
            nodes: {{
                shape: 'box',
                margin: 10,
                widthConstraint: {{ maximum: 200 }},
            }},
            edges: {{
                smooth: {{ type: 'cubicBezier' }},
            }},
            physics: {{
                enabled: true,
                stabilization: {{ iterations: 200 }},
            }},
            groups: {{
                form: {{ color: {{ background: '#97C2FC' }} }},
                workflow: {{ color: {{ background: '#FFCC66' }} }},
                task_type: {{ color: {{ background: '#C2E59C' }} }},
                external_form: {{ color: {{ background: '#D2D2D2' }} }},
                external_task_type: {{ color: {{ background: '#D2D2D2' }} }},
            }},
        }};

        new vis.Network(container, data, options);
    </script>
</body>
</html>"#,
        title = safe_title,
        node_count = nodes.len(),
        edge_count = edges.len(),
        nodes_json = nodes_json,
        edges_json = edges_json,
    ))
}

/// Write the HTML visualization, creating parent directories.
pub fn export_html(graph: &SolutionGraph, output_path: &Path, title: &str) -> Result<PathBuf> {
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(output_path, render_html(graph, title)?)?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::analyze_solution;
    use crate::graph::build_graph;
    use crate::model::FormDefinition;
    use serde_json::json;

    #[test]
    fn test_render_embeds_nodes_and_edges() {
        let forms = vec![
            FormDefinition::from_value(json!({
                "id": "1", "name": "Intake",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2"}
                }
            })),
            FormDefinition::from_value(json!({"id": "2", "name": "Parent", "external": true})),
        ];
        let rels = analyze_solution(&forms, None, None);
        let graph = build_graph(&forms, &[], &rels, &[], Some("room-1"));

        let html = render_html(&graph, "Solution Graph").unwrap();
        assert!(html.contains("Nodes: 2 | Edges: 1"));
        assert!(html.contains(r#""label":"Intake""#));
        assert!(html.contains(r#""group":"external_form""#));
        assert!(html.contains(r#""label":"REFERENCE""#));
        assert!(html.contains("container room-1"));
    }

    #[test]
    fn test_title_is_escaped() {
        let graph = build_graph(&[], &[], &[], &[], None);
        let html = render_html(&graph, "<script>x</script>").unwrap();
        assert!(!html.contains("<script>x"));
    }
}

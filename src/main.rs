use anyhow::{Context, Result};
use clap::Parser;
use std::collections::HashSet;
use std::path::PathBuf;

use solmap::analyzer;
use solmap::client::ApiClient;
use solmap::config::Config;
use solmap::credentials;
use solmap::fetch;
use solmap::graph::{build_graph, GraphStats};
use solmap::model::{EntityDefinition, TaskTypeDefinition};
use solmap::output::summary::{self, SummaryClient};
use solmap::output::{html, json, markdown, mermaid};
use solmap::version;

#[derive(Parser, Debug)]
#[command(name = "solmap", version)]
#[command(about = "Map a solution's forms, workflows, and task types into a dependency graph")]
struct Args {
    /// Container (room) id to map
    #[arg(short = 'r', long)]
    room_id: String,

    /// API token; falls back to the token env var, then the saved credential
    #[arg(short, long)]
    token: Option<String>,

    /// Output directory for generated files
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// API base URL (overrides config)
    #[arg(long)]
    base_url: Option<String>,

    /// Save the resolved token for future runs
    #[arg(long)]
    save_token: bool,

    /// Skip the AI summary even when an API key is configured
    #[arg(long)]
    no_ai: bool,

    /// Print the connections of one node id after mapping
    #[arg(long)]
    inspect: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    let mut config = Config::load()?;
    if let Some(base_url) = args.base_url.clone() {
        config.api.base_url = base_url;
    }
    config.validate()?;

    if let Some(latest) = version::check_for_update().await {
        log::info!(
            "A newer version {} is available: {}",
            latest,
            version::download_url()
        );
    }

    let token = args
        .token
        .clone()
        .or_else(|| {
            std::env::var(&config.api.token_env)
                .ok()
                .filter(|t| !t.is_empty())
        })
        .or_else(credentials::load_saved_pat)
        .with_context(|| {
            format!(
                "No API token. Pass --token or set {} (a token saved with --save-token also works).",
                config.api.token_env
            )
        })?;

    if args.save_token {
        let path = credentials::save_pat(&token)?;
        log::info!(
            "Saved token {} to {}",
            credentials::mask_pat(&token),
            path.display()
        );
    }

    let client = ApiClient::new(&config.api.base_url, &token, config.fetch.timeout_secs)?;

    log::info!("Mapping container {}...", args.room_id);
    let mut data =
        fetch::fetch_solution(&client, &args.room_id, config.fetch.max_concurrent).await?;

    // First pass: find forms referenced from outside the container.
    let first_pass = analyzer::analyze_solution(&data.forms, Some(&data.actions), None);
    let existing: HashSet<String> = data
        .forms
        .iter()
        .filter_map(|f| f.entity_id())
        .map(str::to_string)
        .collect();
    let referenced = analyzer::referenced_form_ids(&first_pass);
    let external =
        fetch::fetch_external_forms(&client, &referenced, &existing, config.fetch.max_concurrent)
            .await;
    data.forms.extend(external);

    // Task-type discovery re-analyzes until no new ids appear; its final
    // pass yields the canonical relationship set.
    let discovery =
        fetch::discover_task_types(&client, &data.forms, &mut data.actions, &args.room_id).await;
    log::info!(
        "Analysis complete after {} pass(es): {} relationships, {} task types",
        discovery.passes,
        discovery.relationships.len(),
        discovery.task_types.len()
    );
    let relationships = discovery.relationships;
    let task_types: Vec<TaskTypeDefinition> = discovery.task_types.into_values().collect();

    let graph = build_graph(
        &data.forms,
        &data.workflows,
        &relationships,
        &task_types,
        Some(&args.room_id),
    );
    let stats = graph.stats();

    let output_dir = args.output.clone().unwrap_or_else(|| config.output.dir.clone());

    let export = json::build_export(
        &args.room_id,
        &data.forms,
        &data.workflows,
        &task_types,
        &relationships,
        stats.clone(),
    );
    let json_path = json::export_json(&export, &output_dir.join("solution.json"))?;
    log::info!("Wrote {}", json_path.display());

    let mermaid_path = mermaid::export_mermaid(&graph, &output_dir.join("solution.mmd"))?;
    log::info!("Wrote {}", mermaid_path.display());

    let html_path = html::export_html(
        &graph,
        &output_dir.join("solution.html"),
        &format!("Solution Graph - {}", args.room_id),
    )?;
    log::info!("Wrote {}", html_path.display());

    let basic = markdown::generate_basic_markdown(&args.room_id, &data.forms, &data.workflows, &stats);
    let markdown_text = if args.no_ai {
        basic
    } else {
        match SummaryClient::from_env() {
            Some(summarizer) => {
                let prompt = markdown::generate_summary_prompt(
                    &args.room_id,
                    &data.forms,
                    &data.workflows,
                    &stats,
                    &graph,
                );
                log::info!("Generating AI summary...");
                match summarizer.generate(&prompt).await {
                    Ok(text) => text,
                    Err(e) => {
                        log::warn!("AI summary failed: {}", e);
                        basic
                    }
                }
            }
            None => {
                log::info!(
                    "Skipping AI summary - {} not set",
                    summary::GEMINI_API_KEY_ENV
                );
                basic
            }
        }
    };
    let md_path = markdown::export_markdown(&markdown_text, &output_dir.join("solution.md"))?;
    log::info!("Wrote {}", md_path.display());

    print_stats(&args.room_id, &stats);

    if let Some(node_id) = &args.inspect {
        match graph.neighbors(node_id) {
            Some(info) => print_neighbors(&info),
            None => eprintln!("Node {} not found", node_id),
        }
    }

    Ok(())
}

fn print_neighbors(info: &solmap::graph::NodeNeighbors) {
    let kind = info
        .node_type
        .map(|k| k.as_str())
        .unwrap_or("unknown");
    println!(
        "{} ({}, {})",
        info.name.as_deref().unwrap_or(&info.id),
        info.id,
        kind
    );
    println!("\nReferenced by:");
    if info.referenced_by.is_empty() {
        println!("  (none)");
    }
    for entry in &info.referenced_by {
        println!(
            "  {} [{}{}]",
            entry.name.as_deref().unwrap_or(&entry.id),
            entry.relationship,
            entry
                .field
                .as_deref()
                .map(|f| format!(", field: {}", f))
                .unwrap_or_default()
        );
    }
    println!("\nReferences:");
    if info.references.is_empty() {
        println!("  (none)");
    }
    for entry in &info.references {
        println!(
            "  {} [{}{}]",
            entry.name.as_deref().unwrap_or(&entry.id),
            entry.relationship,
            entry
                .field
                .as_deref()
                .map(|f| format!(", field: {}", f))
                .unwrap_or_default()
        );
    }
    println!();
}

/// Human-readable stats block printed at the end of a run.
fn print_stats(container_id: &str, stats: &GraphStats) {
    println!("\n=== Solution Map: {} ===\n", container_id);
    println!("{:-<40}", "");
    println!("{:<28} {:>10}", "Metric", "Count");
    println!("{:-<40}", "");
    println!("{:<28} {:>10}", "Forms", stats.form_count);
    println!("{:<28} {:>10}", "Workflows", stats.workflow_count);
    println!("{:<28} {:>10}", "Task types", stats.task_type_count);
    println!("{:<28} {:>10}", "Total nodes", stats.total_nodes);
    println!("{:<28} {:>10}", "Relationships", stats.total_edges);
    println!("{:<28} {:>10}", "  from fields", stats.field_edges);
    println!("{:<28} {:>10}", "  from actions", stats.action_edges);
    println!("{:<28} {:>10}", "Isolated nodes", stats.isolated_nodes);
    println!("{:<28} {:>10}", "Connected components", stats.connected_components);
    println!("{:-<40}", "");

    if !stats.most_referenced.is_empty() {
        println!("\nMost referenced:");
        for rank in &stats.most_referenced {
            println!(
                "  {} ({} references)",
                rank.name.as_deref().unwrap_or(&rank.id),
                rank.count
            );
        }
    }
    if !stats.most_referencing.is_empty() {
        println!("\nMost referencing:");
        for rank in &stats.most_referencing {
            println!(
                "  {} ({} references)",
                rank.name.as_deref().unwrap_or(&rank.id),
                rank.count
            );
        }
    }
    println!();
}

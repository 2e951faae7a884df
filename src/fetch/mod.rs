//! Batch fetching of solution data: listings, definitions, actions,
//! external entities, and task-type discovery.
//!
//! Per-entity failures degrade with a warning instead of aborting the
//! run; only the initial container listings are fatal.

use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::analyzer::{self, ActionMap, Relationship, TaskTypeMap};
use crate::client::ApiClient;
use crate::error::Result;
use crate::model::{
    ActionDefinition, EntityDefinition, FormDefinition, TaskTypeDefinition, WorkflowDefinition,
    DEFAULT_TASK_FORM_TYPE,
};

/// Everything fetched for one container before analysis.
pub struct SolutionData {
    pub container_id: String,
    pub forms: Vec<FormDefinition>,
    pub workflows: Vec<WorkflowDefinition>,
    pub actions: ActionMap,
}

/// Result of the task-type discovery fixed point: the definitions found
/// and the relationship set from the final analysis pass.
pub struct TaskTypeDiscovery {
    pub task_types: TaskTypeMap,
    pub relationships: Vec<Relationship>,
    pub passes: usize,
}

fn list_from_value(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        _ => Vec::new(),
    }
}

/// Ids that are referenced but not yet fetched, in sorted order.
fn missing_ids(referenced: &HashSet<String>, existing: &HashSet<String>) -> Vec<String> {
    let mut missing: Vec<String> = referenced.difference(existing).cloned().collect();
    missing.sort();
    missing
}

/// List all forms in a container.
pub async fn fetch_forms_list(
    client: &ApiClient,
    container_id: &str,
) -> Result<Vec<FormDefinition>> {
    let value = client.get_with_params("/forms", &[("c", container_id)]).await?;
    Ok(list_from_value(value)
        .into_iter()
        .map(FormDefinition::from_value)
        .collect())
}

/// List all workflows in a container.
pub async fn fetch_workflows_list(
    client: &ApiClient,
    container_id: &str,
) -> Result<Vec<WorkflowDefinition>> {
    let value = client
        .get_with_params("/workflows", &[("c", container_id)])
        .await?;
    Ok(list_from_value(value)
        .into_iter()
        .map(WorkflowDefinition::from_value)
        .collect())
}

/// Fetch one form's full definition including its field schema.
pub async fn fetch_form_definition(client: &ApiClient, form_id: &str) -> Result<FormDefinition> {
    let value = client.get(&format!("/forms/{}", form_id)).await?;
    Ok(FormDefinition::from_value(value))
}

/// Fetch full definitions for all listed forms in parallel, bounded by a
/// semaphore. A failed fetch degrades to the listing stub.
pub async fn fetch_all_form_definitions(
    client: &ApiClient,
    forms: Vec<FormDefinition>,
    max_concurrent: usize,
) -> Vec<FormDefinition> {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let tasks = forms.into_iter().map(|form| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let Some(id) = form.entity_id().map(str::to_string) else {
                return form;
            };
            match fetch_form_definition(client, &id).await {
                Ok(definition) => definition,
                Err(e) => {
                    log::warn!("Failed to fetch form {}: {}", id, e);
                    form
                }
            }
        }
    });

    join_all(tasks).await
}

/// Fetch custom actions for a set of entities. Entities whose action list
/// cannot be fetched get an empty list.
pub async fn fetch_actions(
    client: &ApiClient,
    entity_ids: &[String],
    max_concurrent: usize,
) -> ActionMap {
    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));

    let tasks = entity_ids.iter().map(|id| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            let actions = match client.get(&format!("/forms/{}/actions", id)).await {
                Ok(value) => list_from_value(value)
                    .into_iter()
                    .map(ActionDefinition::from_value)
                    .collect(),
                Err(e) => {
                    log::warn!("Failed to fetch actions for {}: {}", id, e);
                    Vec::new()
                }
            };
            (id.clone(), actions)
        }
    });

    join_all(tasks).await.into_iter().collect()
}

/// Fetch forms referenced by the solution but not present in it, marking
/// each as external. Unfetchable ids are skipped with a warning.
pub async fn fetch_external_forms(
    client: &ApiClient,
    referenced_ids: &HashSet<String>,
    existing_ids: &HashSet<String>,
    max_concurrent: usize,
) -> Vec<FormDefinition> {
    let missing = missing_ids(referenced_ids, existing_ids);
    if missing.is_empty() {
        return Vec::new();
    }
    log::info!("Fetching {} external forms...", missing.len());

    let semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
    let tasks = missing.iter().map(|id| {
        let semaphore = Arc::clone(&semaphore);
        async move {
            let _permit = semaphore.acquire().await.expect("semaphore closed");
            match fetch_form_definition(client, id).await {
                Ok(mut form) => {
                    form.external = true;
                    Some(form)
                }
                Err(e) => {
                    log::warn!("Could not fetch external form {}: {}", id, e);
                    None
                }
            }
        }
    });

    let external: Vec<FormDefinition> = join_all(tasks).await.into_iter().flatten().collect();
    log::info!("Fetched {} external forms", external.len());
    external
}

/// Fetch one task type definition by category id.
pub async fn fetch_task_type(
    client: &ApiClient,
    category_id: &str,
    container_id: &str,
) -> Result<TaskTypeDefinition> {
    let value = client
        .get_with_params(
            &format!("/tasks/categories/{}", category_id),
            &[("c", container_id)],
        )
        .await?;
    Ok(TaskTypeDefinition::from_value(value))
}

async fn fetch_task_type_actions(client: &ApiClient, category_id: &str) -> Vec<ActionDefinition> {
    match client
        .get(&format!("/tasks/categories/{}/actions", category_id))
        .await
    {
        Ok(value) => list_from_value(value)
            .into_iter()
            .map(ActionDefinition::from_value)
            .collect(),
        Err(e) => {
            log::warn!("Failed to fetch actions for task type {}: {}", category_id, e);
            Vec::new()
        }
    }
}

/// Discover task types to a fixed point.
///
/// Task types can reference further task types through their own fields
/// and actions, so one pass is not enough. Each round analyzes with the
/// definitions known so far, fetches whatever new task-type ids the
/// relationships reference, and repeats until a round finds nothing new.
/// Ids that fail to fetch are remembered so the loop terminates.
pub async fn discover_task_types(
    client: &ApiClient,
    forms: &[FormDefinition],
    actions: &mut ActionMap,
    container_id: &str,
) -> TaskTypeDiscovery {
    let mut task_types = TaskTypeMap::new();
    let mut failed: HashSet<String> = HashSet::new();
    let mut passes = 0;

    loop {
        passes += 1;
        let relationships = analyzer::analyze_solution(forms, Some(&*actions), Some(&task_types));

        let mut wanted: Vec<(String, Option<String>)> = Vec::new();
        let mut queued: HashSet<String> = HashSet::new();
        for rel in &relationships {
            if rel.target_type != analyzer::TargetType::TaskType {
                continue;
            }
            if task_types.contains_key(&rel.target_id)
                || failed.contains(&rel.target_id)
                || !queued.insert(rel.target_id.clone())
            {
                continue;
            }
            wanted.push((rel.target_id.clone(), rel.target_container_id.clone()));
        }

        if wanted.is_empty() {
            return TaskTypeDiscovery {
                task_types,
                relationships,
                passes,
            };
        }
        log::info!("Fetching {} task type definitions...", wanted.len());

        for (id, container_hint) in wanted {
            let container = container_hint.as_deref().unwrap_or(container_id);
            match fetch_task_type(client, &id, container).await {
                Ok(mut task_type) => {
                    if task_type.category_id.is_none() {
                        task_type.category_id = Some(id.clone());
                    }
                    if task_type.form_type.is_none() {
                        task_type.form_type = Some(DEFAULT_TASK_FORM_TYPE.to_string());
                    }
                    // Defined above the solution container means external.
                    let own_container =
                        task_type.container.as_ref().and_then(|c| c.id.as_deref());
                    task_type.external =
                        own_container.map(|c| c != container_id).unwrap_or(false);

                    let task_actions = fetch_task_type_actions(client, &id).await;
                    if !task_actions.is_empty() {
                        actions.insert(id.clone(), task_actions);
                    }
                    task_types.insert(id, task_type);
                }
                Err(e) => {
                    log::warn!("Could not fetch task type {}: {}", id, e);
                    failed.insert(id);
                }
            }
        }
    }
}

/// Fetch complete solution data for a container: form and workflow
/// listings, full form definitions, and per-form actions.
pub async fn fetch_solution(
    client: &ApiClient,
    container_id: &str,
    max_concurrent: usize,
) -> Result<SolutionData> {
    log::info!("Fetching forms list...");
    let forms = fetch_forms_list(client, container_id).await?;
    log::info!("Found {} forms", forms.len());

    log::info!("Fetching workflows list...");
    let workflows = fetch_workflows_list(client, container_id).await?;
    log::info!("Found {} workflows", workflows.len());

    log::info!("Fetching {} form definitions...", forms.len());
    let forms = fetch_all_form_definitions(client, forms, max_concurrent).await;

    let form_ids: Vec<String> = forms
        .iter()
        .filter_map(|f| f.entity_id())
        .map(str::to_string)
        .collect();
    log::info!("Fetching actions for {} forms...", form_ids.len());
    let actions = fetch_actions(client, &form_ids, max_concurrent).await;

    Ok(SolutionData {
        container_id: container_id.to_string(),
        forms,
        workflows,
        actions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_list_from_value() {
        assert_eq!(list_from_value(json!([1, 2])).len(), 2);
        assert!(list_from_value(json!({"not": "a list"})).is_empty());
        assert!(list_from_value(json!(null)).is_empty());
    }

    #[test]
    fn test_missing_ids() {
        let referenced: HashSet<String> =
            ["1", "2", "3"].iter().map(|s| s.to_string()).collect();
        let existing: HashSet<String> = ["2"].iter().map(|s| s.to_string()).collect();
        assert_eq!(missing_ids(&referenced, &existing), vec!["1", "3"]);
        assert!(missing_ids(&existing, &existing).is_empty());
    }
}

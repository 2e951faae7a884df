//! Relationship extraction for solution entities.
//!
//! Turns form and task type definitions into a deduplicated list of typed
//! relationships pointing at other entities. Pure functions over
//! already-fetched records: no I/O, no logging, no retries. Malformed or
//! incomplete input degrades to skipped relationships or placeholder names.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::model::{
    code_from_value, id_from_value, ActionDefinition, ActionObjectType, ContainerTargetType,
    EntityDefinition, FieldKind, FormDefinition, TaskTypeDefinition,
};

/// Consequence type for actions that call out to an external API; these
/// never reference another solution entity.
pub const CONSEQUENCE_CALL_REST_API: &str = "CALL_REST_API";

/// Kind of entity a relationship points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetType {
    #[serde(rename = "form")]
    Form,
    #[serde(rename = "workflow")]
    Workflow,
    #[serde(rename = "task_type")]
    TaskType,
    #[serde(rename = "template")]
    Template,
    #[serde(rename = "plan")]
    Plan,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Form => "form",
            Self::Workflow => "workflow",
            Self::TaskType => "task_type",
            Self::Template => "template",
            Self::Plan => "plan",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a relationship was configured: a field type tag, or the consequence
/// of a custom action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipType {
    #[serde(rename = "REFERENCE")]
    Reference,
    #[serde(rename = "FORM_ENTRY")]
    FormEntry,
    #[serde(rename = "LOOKUP")]
    Lookup,
    #[serde(rename = "WORKFLOW")]
    Workflow,
    #[serde(rename = "WORKFLOW_LOOKUP")]
    WorkflowLookup,
    #[serde(rename = "TASK")]
    Task,
    #[serde(rename = "ACTION_CREATES_ENTRY")]
    ActionCreatesEntry,
    #[serde(rename = "ACTION_INVOKES_WORKFLOW")]
    ActionInvokesWorkflow,
    #[serde(rename = "ACTION_CREATES_TASK")]
    ActionCreatesTask,
    #[serde(rename = "ACTION_LAUNCHES_TEMPLATE")]
    ActionLaunchesTemplate,
    #[serde(rename = "ACTION_LAUNCHES_PLAN")]
    ActionLaunchesPlan,
}

impl RelationshipType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reference => "REFERENCE",
            Self::FormEntry => "FORM_ENTRY",
            Self::Lookup => "LOOKUP",
            Self::Workflow => "WORKFLOW",
            Self::WorkflowLookup => "WORKFLOW_LOOKUP",
            Self::Task => "TASK",
            Self::ActionCreatesEntry => "ACTION_CREATES_ENTRY",
            Self::ActionInvokesWorkflow => "ACTION_INVOKES_WORKFLOW",
            Self::ActionCreatesTask => "ACTION_CREATES_TASK",
            Self::ActionLaunchesTemplate => "ACTION_LAUNCHES_TEMPLATE",
            Self::ActionLaunchesPlan => "ACTION_LAUNCHES_PLAN",
        }
    }
}

impl fmt::Display for RelationshipType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed, typed reference from one entity to another.
///
/// `target_name` is the display name when it was resolvable at extraction
/// time; the graph step may fill it in later. Action metadata is populated
/// only for action-derived relationships, `target_container_id` only for
/// task type targets, and `is_subform` only for REFERENCE fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub source_id: String,
    pub source_name: String,
    pub target_id: String,
    pub target_name: Option<String>,
    pub target_type: TargetType,
    pub relationship_type: RelationshipType,
    pub field_name: Option<String>,
    pub action_id: Option<String>,
    pub action_name: Option<String>,
    pub trigger_type: Option<String>,
    pub automatic: Option<bool>,
    pub target_container_id: Option<String>,
    pub is_subform: Option<bool>,
}

impl Relationship {
    fn new(
        source_id: &str,
        source_name: &str,
        target_id: String,
        target_type: TargetType,
        relationship_type: RelationshipType,
    ) -> Self {
        Self {
            source_id: source_id.to_string(),
            source_name: source_name.to_string(),
            target_id,
            target_name: None,
            target_type,
            relationship_type,
            field_name: None,
            action_id: None,
            action_name: None,
            trigger_type: None,
            automatic: None,
            target_container_id: None,
            is_subform: None,
        }
    }

    /// Composite identity used for deduplication. Descriptive metadata
    /// (resolved names, trigger details) is deliberately excluded.
    fn dedup_key(&self) -> RelationshipKey {
        (
            self.source_id.clone(),
            self.target_id.clone(),
            self.target_type,
            self.relationship_type,
            self.field_name.clone(),
            self.action_id.clone(),
        )
    }
}

type RelationshipKey = (
    String,
    String,
    TargetType,
    RelationshipType,
    Option<String>,
    Option<String>,
);

/// Extract field-level relationships from a single entity definition.
///
/// Fields with an unrecognized type, or whose target id is not configured,
/// contribute nothing.
pub fn extract_relationships(entity: &impl EntityDefinition) -> Vec<Relationship> {
    let mut relationships = Vec::new();
    let source_id = entity.entity_id().unwrap_or_default().to_string();
    let source_name = entity.entity_name();

    for (field_id, field) in entity.entity_fields() {
        let field_name = field
            .name
            .clone()
            .unwrap_or_else(|| format!("Field {}", field_id));

        match field.field_type {
            FieldKind::Reference | FieldKind::FormEntry | FieldKind::Lookup => {
                let Some(target_id) = field.source_form_id.clone() else {
                    continue;
                };
                let relationship_type = match field.field_type {
                    FieldKind::Reference => RelationshipType::Reference,
                    FieldKind::FormEntry => RelationshipType::FormEntry,
                    _ => RelationshipType::Lookup,
                };
                let mut rel = Relationship::new(
                    &source_id,
                    source_name,
                    target_id,
                    TargetType::Form,
                    relationship_type,
                );
                rel.target_name = field.source_form.as_ref().and_then(|f| f.name.clone());
                rel.field_name = Some(field_name);
                if field.field_type == FieldKind::Reference {
                    // Absent or falsy is "not a subform", never "unknown".
                    rel.is_subform = Some(field.properties.reference_new_entry);
                }
                relationships.push(rel);
            }
            FieldKind::Workflow | FieldKind::WorkflowLookup => {
                let Some(target_id) = field.properties.process_id.clone() else {
                    continue;
                };
                let relationship_type = if field.field_type == FieldKind::Workflow {
                    RelationshipType::Workflow
                } else {
                    RelationshipType::WorkflowLookup
                };
                let mut rel = Relationship::new(
                    &source_id,
                    source_name,
                    target_id,
                    TargetType::Workflow,
                    relationship_type,
                );
                rel.target_name = field.properties.process_name.clone();
                rel.field_name = Some(field_name);
                relationships.push(rel);
            }
            FieldKind::Task => {
                let Some(target_id) = field.properties.task_type_filter.clone() else {
                    continue;
                };
                // Task type names always come from a follow-up fetch.
                let mut rel = Relationship::new(
                    &source_id,
                    source_name,
                    target_id,
                    TargetType::TaskType,
                    RelationshipType::Task,
                );
                rel.field_name = Some(field_name);
                rel.target_container_id = field.properties.task_type_container.clone();
                relationships.push(rel);
            }
            FieldKind::Other => {}
        }
    }

    relationships
}

/// Extract relationships from an entity's custom actions.
///
/// An action can emit zero, one, or two relationships: one from its target
/// object (create entry / invoke workflow / create task) and one from its
/// target container (launch template / launch plan).
pub fn extract_action_relationships(
    source_id: &str,
    source_name: &str,
    actions: &[ActionDefinition],
) -> Vec<Relationship> {
    let mut relationships = Vec::new();

    for action in actions {
        if action.consequence_type.as_deref() == Some(CONSEQUENCE_CALL_REST_API) {
            continue;
        }
        let Some(params) = action.parameters.as_object() else {
            continue;
        };

        let object_type = params
            .get("targetObjectType")
            .and_then(code_from_value)
            .and_then(ActionObjectType::from_code);

        if let Some(object_type) = object_type.filter(|t| !t.is_skipped()) {
            let mapping = match object_type {
                ActionObjectType::CreateEntry => Some((
                    RelationshipType::ActionCreatesEntry,
                    TargetType::Form,
                    "targetForm",
                )),
                ActionObjectType::InvokeWorkflow => Some((
                    RelationshipType::ActionInvokesWorkflow,
                    TargetType::Workflow,
                    "targetProcess",
                )),
                ActionObjectType::CreateTask => Some((
                    RelationshipType::ActionCreatesTask,
                    TargetType::TaskType,
                    "targetTaskType",
                )),
                _ => None,
            };
            if let Some((relationship_type, target_type, id_key)) = mapping {
                if let Some(target_id) = params.get(id_key).and_then(id_from_value) {
                    let mut rel = Relationship::new(
                        source_id,
                        source_name,
                        target_id,
                        target_type,
                        relationship_type,
                    );
                    rel.action_id = action.id.clone();
                    rel.action_name = Some(
                        action
                            .name
                            .clone()
                            .unwrap_or_else(|| "Unknown Action".to_string()),
                    );
                    rel.trigger_type = action.trigger_type.clone();
                    rel.automatic = Some(action.automatic);
                    if target_type == TargetType::TaskType {
                        // The defining container can live under several keys
                        // depending on action vintage; first present wins.
                        rel.target_container_id = [
                            "targetTaskTypeContainer",
                            "taskTypeContainer",
                            "targetContainer",
                        ]
                        .iter()
                        .find_map(|key| params.get(*key).and_then(id_from_value));
                    }
                    relationships.push(rel);
                }
            }
        }

        // Launch relationships are independent of the object branch above.
        let container_type = params
            .get("targetContainerType")
            .and_then(code_from_value)
            .and_then(ContainerTargetType::from_code);
        if let Some(container_type) = container_type {
            if let Some(target_id) = params.get("targetContainerId").and_then(id_from_value) {
                let (relationship_type, target_type) = match container_type {
                    ContainerTargetType::Template => {
                        (RelationshipType::ActionLaunchesTemplate, TargetType::Template)
                    }
                    ContainerTargetType::Plan => {
                        (RelationshipType::ActionLaunchesPlan, TargetType::Plan)
                    }
                };
                let mut rel = Relationship::new(
                    source_id,
                    source_name,
                    target_id,
                    target_type,
                    relationship_type,
                );
                rel.action_id = action.id.clone();
                rel.action_name = Some(
                    action
                        .name
                        .clone()
                        .unwrap_or_else(|| "Unknown Action".to_string()),
                );
                rel.trigger_type = action.trigger_type.clone();
                rel.automatic = Some(action.automatic);
                relationships.push(rel);
            }
        }
    }

    relationships
}

/// Action lists keyed by owning entity id.
pub type ActionMap = std::collections::HashMap<String, Vec<ActionDefinition>>;

/// Known task type definitions keyed by category id.
pub type TaskTypeMap = std::collections::BTreeMap<String, TaskTypeDefinition>;

/// Analyze a full solution: walk every form's fields and actions, then
/// every known task type with the same logic, and deduplicate.
///
/// Pass-agnostic: callers that discover further task types re-run this with
/// the enlarged `task_types` map.
pub fn analyze_solution(
    forms: &[FormDefinition],
    actions: Option<&ActionMap>,
    task_types: Option<&TaskTypeMap>,
) -> Vec<Relationship> {
    let mut all = Vec::new();

    for form in forms {
        all.extend(extract_relationships(form));
        if let (Some(actions), Some(id)) = (actions, form.entity_id()) {
            if let Some(list) = actions.get(id) {
                all.extend(extract_action_relationships(id, form.entity_name(), list));
            }
        }
    }

    if let Some(task_types) = task_types {
        for task_type in task_types.values() {
            all.extend(extract_relationships(task_type));
            if let (Some(actions), Some(id)) = (actions, task_type.entity_id()) {
                if let Some(list) = actions.get(id) {
                    all.extend(extract_action_relationships(
                        id,
                        task_type.display_name(),
                        list,
                    ));
                }
            }
        }
    }

    dedup_relationships(all)
}

/// Drop relationships without a target and collapse duplicates on the
/// composite key, keeping the first occurrence in order.
pub fn dedup_relationships(relationships: Vec<Relationship>) -> Vec<Relationship> {
    let mut seen: HashSet<RelationshipKey> = HashSet::new();
    let mut unique = Vec::new();

    for rel in relationships {
        if rel.target_id.is_empty() {
            continue;
        }
        if seen.insert(rel.dedup_key()) {
            unique.push(rel);
        }
    }

    unique
}

/// Target form ids referenced by a relationship list.
pub fn referenced_form_ids(relationships: &[Relationship]) -> HashSet<String> {
    referenced_ids(relationships, TargetType::Form)
}

/// Target workflow ids referenced by a relationship list.
pub fn referenced_workflow_ids(relationships: &[Relationship]) -> HashSet<String> {
    referenced_ids(relationships, TargetType::Workflow)
}

/// Target task type ids referenced by a relationship list.
pub fn referenced_task_type_ids(relationships: &[Relationship]) -> HashSet<String> {
    referenced_ids(relationships, TargetType::TaskType)
}

fn referenced_ids(relationships: &[Relationship], target_type: TargetType) -> HashSet<String> {
    relationships
        .iter()
        .filter(|r| r.target_type == target_type)
        .map(|r| r.target_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ActionDefinition, FormDefinition, TaskTypeDefinition};
    use serde_json::json;

    fn form(value: serde_json::Value) -> FormDefinition {
        FormDefinition::from_value(value)
    }

    fn action(value: serde_json::Value) -> ActionDefinition {
        ActionDefinition::from_value(value)
    }

    #[test]
    fn test_reference_field_extraction() {
        let f = form(json!({
            "id": "1",
            "name": "Intake",
            "fields": {
                "f1": {
                    "fieldType": "REFERENCE",
                    "name": "Parent",
                    "sourceFormId": "2",
                    "sourceForm": {"name": "Parent Form"},
                    "properties": {}
                }
            }
        }));
        let rels = extract_relationships(&f);
        assert_eq!(rels.len(), 1);
        let rel = &rels[0];
        assert_eq!(rel.source_id, "1");
        assert_eq!(rel.source_name, "Intake");
        assert_eq!(rel.target_id, "2");
        assert_eq!(rel.target_name.as_deref(), Some("Parent Form"));
        assert_eq!(rel.target_type, TargetType::Form);
        assert_eq!(rel.relationship_type, RelationshipType::Reference);
        assert_eq!(rel.field_name.as_deref(), Some("Parent"));
        assert_eq!(rel.is_subform, Some(false));
        assert!(rel.action_id.is_none());
    }

    #[test]
    fn test_reference_missing_source_form_id_is_skipped() {
        let f = form(json!({
            "id": "1",
            "name": "Intake",
            "fields": {"f1": {"fieldType": "REFERENCE", "name": "Unconfigured"}}
        }));
        assert!(extract_relationships(&f).is_empty());
    }

    #[test]
    fn test_subform_flag_policy() {
        let f = form(json!({
            "id": "1",
            "fields": {
                "a": {"fieldType": "REFERENCE", "sourceFormId": "2",
                      "properties": {"referenceNewEntry": true}},
                "b": {"fieldType": "REFERENCE", "sourceFormId": "3",
                      "properties": {"referenceNewEntry": false}},
                "c": {"fieldType": "LOOKUP", "sourceFormId": "4"}
            }
        }));
        let rels = extract_relationships(&f);
        assert_eq!(rels.len(), 3);
        let by_target = |id: &str| rels.iter().find(|r| r.target_id == id).unwrap();
        assert_eq!(by_target("2").is_subform, Some(true));
        assert_eq!(by_target("3").is_subform, Some(false));
        // Non-REFERENCE relationships never carry the flag.
        assert_eq!(by_target("4").is_subform, None);
    }

    #[test]
    fn test_workflow_field_keeps_original_tag() {
        let f = form(json!({
            "id": "1",
            "name": "Intake",
            "fields": {
                "w1": {"fieldType": "WORKFLOW", "name": "Kickoff",
                       "properties": {"processId": 500, "processName": "Kickoff Flow"}},
                "w2": {"fieldType": "WORKFLOW_LOOKUP", "name": "Status",
                       "properties": {"processId": "501"}},
                "w3": {"fieldType": "WORKFLOW", "name": "Unset", "properties": {}}
            }
        }));
        let rels = extract_relationships(&f);
        assert_eq!(rels.len(), 2);
        let wf = rels.iter().find(|r| r.target_id == "500").unwrap();
        assert_eq!(wf.relationship_type, RelationshipType::Workflow);
        assert_eq!(wf.target_name.as_deref(), Some("Kickoff Flow"));
        assert_eq!(wf.target_type, TargetType::Workflow);
        let lookup = rels.iter().find(|r| r.target_id == "501").unwrap();
        assert_eq!(lookup.relationship_type, RelationshipType::WorkflowLookup);
        assert!(lookup.target_name.is_none());
    }

    #[test]
    fn test_task_field_extraction() {
        let f = form(json!({
            "id": "1",
            "fields": {
                "t1": {"fieldType": "TASK", "name": "Follow-ups",
                       "properties": {"taskTypeFilter": "77", "taskTypeContainer": 99}}
            }
        }));
        let rels = extract_relationships(&f);
        assert_eq!(rels.len(), 1);
        let rel = &rels[0];
        assert_eq!(rel.target_type, TargetType::TaskType);
        assert_eq!(rel.target_id, "77");
        assert_eq!(rel.target_container_id.as_deref(), Some("99"));
        assert!(rel.target_name.is_none());
    }

    #[test]
    fn test_unnamed_field_gets_placeholder() {
        let f = form(json!({
            "id": "1",
            "fields": {"f9": {"fieldType": "LOOKUP", "sourceFormId": "2"}}
        }));
        let rels = extract_relationships(&f);
        assert_eq!(rels[0].field_name.as_deref(), Some("Field f9"));
    }

    #[test]
    fn test_unrecognized_field_types_ignored() {
        let f = form(json!({
            "id": "1",
            "fields": {
                "f1": {"fieldType": "TEXT", "name": "Notes"},
                "f2": {"fieldType": "SIGNATURE", "sourceFormId": "2"}
            }
        }));
        assert!(extract_relationships(&f).is_empty());
    }

    #[test]
    fn test_task_type_walked_like_a_form() {
        let tt = TaskTypeDefinition::from_value(json!({
            "categoryId": "42",
            "name": "Inspection",
            "fields": {
                "f1": {"fieldType": "REFERENCE", "name": "Site", "sourceFormId": "8"}
            }
        }));
        let rels = extract_relationships(&tt);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].source_id, "42");
        assert_eq!(rels[0].source_name, "Inspection");
        assert_eq!(rels[0].target_id, "8");
    }

    #[test]
    fn test_action_create_entry() {
        let actions = vec![action(json!({
            "id": "a1",
            "name": "Create follow-up",
            "triggerType": "ON_SUBMIT",
            "automatic": true,
            "parameters": {"targetObjectType": 5, "targetForm": "200"}
        }))];
        let rels = extract_action_relationships("1", "Intake", &actions);
        assert_eq!(rels.len(), 1);
        let rel = &rels[0];
        assert_eq!(rel.relationship_type, RelationshipType::ActionCreatesEntry);
        assert_eq!(rel.target_type, TargetType::Form);
        assert_eq!(rel.target_id, "200");
        assert_eq!(rel.action_id.as_deref(), Some("a1"));
        assert_eq!(rel.action_name.as_deref(), Some("Create follow-up"));
        assert_eq!(rel.trigger_type.as_deref(), Some("ON_SUBMIT"));
        assert_eq!(rel.automatic, Some(true));
        assert!(rel.field_name.is_none());
        assert!(rel.is_subform.is_none());
    }

    #[test]
    fn test_action_rest_api_skipped() {
        let actions = vec![action(json!({
            "id": "a1",
            "consequenceType": "CALL_REST_API",
            "parameters": {"targetObjectType": 5, "targetForm": "200",
                           "targetContainerType": 5, "targetContainerId": "300"}
        }))];
        assert!(extract_action_relationships("1", "Intake", &actions).is_empty());
    }

    #[test]
    fn test_action_skip_codes_suppress_primary_branch_only() {
        for code in [11, 16, 21, 22] {
            let actions = vec![action(json!({
                "id": "a1",
                "parameters": {"targetObjectType": code, "targetForm": "200"}
            }))];
            assert!(
                extract_action_relationships("1", "Intake", &actions).is_empty(),
                "code {} should emit nothing",
                code
            );
        }
        // A skipped object code still allows the launch branch.
        let actions = vec![action(json!({
            "id": "a2",
            "parameters": {"targetObjectType": 16,
                           "targetContainerType": 7, "targetContainerId": "55"}
        }))];
        let rels = extract_action_relationships("1", "Intake", &actions);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type, RelationshipType::ActionLaunchesPlan);
    }

    #[test]
    fn test_action_non_object_parameters_skipped() {
        let actions = vec![
            action(json!({"id": "a1", "parameters": "garbage"})),
            action(json!({"id": "a2", "parameters": [1, 2]})),
            action(json!({"id": "a3"})),
        ];
        assert!(extract_action_relationships("1", "Intake", &actions).is_empty());
    }

    #[test]
    fn test_action_dual_emission() {
        let actions = vec![action(json!({
            "id": "a1",
            "name": "Escalate",
            "triggerType": "ON_UPDATE",
            "parameters": {
                "targetObjectType": 9, "targetProcess": "900",
                "targetContainerType": 5, "targetContainerId": "300"
            }
        }))];
        let rels = extract_action_relationships("1", "Intake", &actions);
        assert_eq!(rels.len(), 2);
        assert_eq!(rels[0].relationship_type, RelationshipType::ActionInvokesWorkflow);
        assert_eq!(rels[0].target_id, "900");
        assert_eq!(rels[1].relationship_type, RelationshipType::ActionLaunchesTemplate);
        assert_eq!(rels[1].target_type, TargetType::Template);
        assert_eq!(rels[1].target_id, "300");
        assert_eq!(rels[1].action_id.as_deref(), Some("a1"));
    }

    #[test]
    fn test_action_task_container_resolution_order() {
        let mk = |params: serde_json::Value| {
            let actions = vec![action(json!({"id": "a1", "parameters": params}))];
            extract_action_relationships("1", "Intake", &actions)
                .pop()
                .unwrap()
        };
        let rel = mk(json!({
            "targetObjectType": 3, "targetTaskType": "77",
            "targetTaskTypeContainer": "A", "taskTypeContainer": "B", "targetContainer": "C"
        }));
        assert_eq!(rel.target_container_id.as_deref(), Some("A"));
        let rel = mk(json!({
            "targetObjectType": 3, "targetTaskType": "77",
            "taskTypeContainer": "B", "targetContainer": "C"
        }));
        assert_eq!(rel.target_container_id.as_deref(), Some("B"));
        let rel = mk(json!({
            "targetObjectType": 3, "targetTaskType": "77", "targetContainer": "C"
        }));
        assert_eq!(rel.target_container_id.as_deref(), Some("C"));
        let rel = mk(json!({"targetObjectType": 3, "targetTaskType": "77"}));
        assert!(rel.target_container_id.is_none());
    }

    #[test]
    fn test_action_missing_target_id_skipped() {
        let actions = vec![action(json!({
            "id": "a1",
            "parameters": {"targetObjectType": 5}
        }))];
        assert!(extract_action_relationships("1", "Intake", &actions).is_empty());
    }

    #[test]
    fn test_unknown_object_code_allows_launch_branch() {
        let actions = vec![action(json!({
            "id": "a1",
            "parameters": {"targetObjectType": 77,
                           "targetContainerType": 5, "targetContainerId": "12"}
        }))];
        let rels = extract_action_relationships("1", "Intake", &actions);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relationship_type, RelationshipType::ActionLaunchesTemplate);
    }

    #[test]
    fn test_dedup_first_seen_survives() {
        let f1 = form(json!({
            "id": "1", "name": "Intake",
            "fields": {
                "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2",
                       "sourceForm": {"name": "First Name"}}
            }
        }));
        let mut rels = extract_relationships(&f1);
        let mut dup = rels[0].clone();
        dup.target_name = Some("Second Name".to_string());
        rels.push(dup);
        let unique = dedup_relationships(rels);
        assert_eq!(unique.len(), 1);
        assert_eq!(unique[0].target_name.as_deref(), Some("First Name"));
    }

    #[test]
    fn test_analyze_solution_idempotent() {
        let forms = vec![
            form(json!({
                "id": "1", "name": "Intake",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Parent", "sourceFormId": "2"},
                    "f2": {"fieldType": "LOOKUP", "name": "Status", "sourceFormId": "2"}
                }
            })),
            form(json!({"id": "2", "name": "Parent Form", "fields": {}})),
        ];
        let first = analyze_solution(&forms, None, None);
        let second = analyze_solution(&forms, None, None);
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_analyze_solution_with_actions_and_task_types() {
        let forms = vec![form(json!({
            "id": "1", "name": "Intake",
            "fields": {
                "t1": {"fieldType": "TASK", "properties": {"taskTypeFilter": "77"}}
            }
        }))];
        let mut actions = ActionMap::new();
        actions.insert(
            "1".to_string(),
            vec![action(json!({
                "id": "a1", "name": "Spawn",
                "parameters": {"targetObjectType": 3, "targetTaskType": "77"}
            }))],
        );
        let mut task_types = TaskTypeMap::new();
        task_types.insert(
            "77".to_string(),
            TaskTypeDefinition::from_value(json!({
                "categoryId": "77", "name": "Inspection",
                "fields": {
                    "f1": {"fieldType": "REFERENCE", "name": "Site", "sourceFormId": "8"}
                }
            })),
        );
        let rels = analyze_solution(&forms, Some(&actions), Some(&task_types));
        assert_eq!(rels.len(), 3);
        assert!(rels.iter().any(|r| r.relationship_type == RelationshipType::Task));
        assert!(rels
            .iter()
            .any(|r| r.relationship_type == RelationshipType::ActionCreatesTask));
        assert!(rels
            .iter()
            .any(|r| r.source_id == "77" && r.target_id == "8"));
    }

    #[test]
    fn test_referenced_id_helpers() {
        let forms = vec![form(json!({
            "id": "1",
            "fields": {
                "a": {"fieldType": "REFERENCE", "sourceFormId": "2"},
                "b": {"fieldType": "WORKFLOW", "properties": {"processId": "500"}},
                "c": {"fieldType": "TASK", "properties": {"taskTypeFilter": "77"}}
            }
        }))];
        let rels = analyze_solution(&forms, None, None);
        assert_eq!(referenced_form_ids(&rels), HashSet::from(["2".to_string()]));
        assert_eq!(
            referenced_workflow_ids(&rels),
            HashSet::from(["500".to_string()])
        );
        assert_eq!(
            referenced_task_type_ids(&rels),
            HashSet::from(["77".to_string()])
        );
    }
}

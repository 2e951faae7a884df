//! Typed records for the raw solution API payloads.
//!
//! The API is loose about shapes: ids arrive as strings or numbers, optional
//! blocks are omitted or null, and field property bags vary by field type.
//! Everything here deserializes leniently so that absence or a wrong type
//! degrades to a documented default instead of an error.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Fallback display name when an entity has none.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Form type backfilled onto task type definitions that omit one.
pub const DEFAULT_TASK_FORM_TYPE: &str = "TASK";

/// Normalize a JSON value to a non-empty id string.
///
/// Accepts strings and numbers (the API emits both); everything else,
/// including the empty string, is treated as "no id".
pub fn id_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Read a numeric code that may arrive as a number or a numeric string.
pub fn code_from_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn de_opt_id<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(value.as_ref().and_then(id_from_value))
}

fn de_truthy<'de, D>(de: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().map(|v| v != 0).unwrap_or(false),
        Some(Value::String(s)) => !s.is_empty() && s != "false" && s != "0",
        _ => false,
    })
}

fn de_fields<'de, D>(de: D) -> Result<BTreeMap<String, FieldDefinition>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(fields_from_value(value.unwrap_or(Value::Null)))
}

fn fields_from_value(value: Value) -> BTreeMap<String, FieldDefinition> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(id, field)| {
                (id, serde_json::from_value(field).unwrap_or_default())
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Field type vocabulary. Unrecognized tags collapse to `Other` and are
/// ignored by the extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum FieldKind {
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
    #[default]
    #[serde(rename = "OTHER")]
    Other,
}

impl FieldKind {
    /// Decode a wire tag; anything unrecognized is `Other`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "REFERENCE" => Self::Reference,
            "FORM_ENTRY" => Self::FormEntry,
            "LOOKUP" => Self::Lookup,
            "WORKFLOW" => Self::Workflow,
            "WORKFLOW_LOOKUP" => Self::WorkflowLookup,
            "TASK" => Self::Task,
            _ => Self::Other,
        }
    }
}

fn de_field_kind<'de, D>(de: D) -> Result<FieldKind, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(de)?;
    Ok(match value {
        Some(Value::String(tag)) => FieldKind::from_tag(&tag),
        _ => FieldKind::Other,
    })
}

/// Inlined target form stub some reference fields carry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceFormRef {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
}

/// Type-specific field configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldProperties {
    #[serde(rename = "processId", deserialize_with = "de_opt_id")]
    pub process_id: Option<String>,
    #[serde(rename = "processName")]
    pub process_name: Option<String>,
    #[serde(rename = "taskTypeFilter", deserialize_with = "de_opt_id")]
    pub task_type_filter: Option<String>,
    #[serde(rename = "taskTypeContainer", deserialize_with = "de_opt_id")]
    pub task_type_container: Option<String>,
    #[serde(rename = "referenceNewEntry", deserialize_with = "de_truthy")]
    pub reference_new_entry: bool,
}

/// One field of a form or task type definition.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldDefinition {
    #[serde(rename = "fieldType", deserialize_with = "de_field_kind")]
    pub field_type: FieldKind,
    pub name: Option<String>,
    #[serde(rename = "sourceFormId", deserialize_with = "de_opt_id")]
    pub source_form_id: Option<String>,
    #[serde(rename = "sourceForm")]
    pub source_form: Option<SourceFormRef>,
    pub properties: FieldProperties,
}

/// A form record: list stub or full definition, the difference being
/// whether `fields` is populated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FormDefinition {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(rename = "formId", deserialize_with = "de_opt_id")]
    pub form_id: Option<String>,
    pub name: Option<String>,
    #[serde(deserialize_with = "de_fields")]
    pub fields: BTreeMap<String, FieldDefinition>,
    pub external: bool,
    #[serde(rename = "containerId", deserialize_with = "de_opt_id")]
    pub container_id: Option<String>,
}

impl FormDefinition {
    /// Ingestion boundary: any JSON value becomes a (possibly empty) record.
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// A workflow record from the container listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowDefinition {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    #[serde(rename = "processId", deserialize_with = "de_opt_id")]
    pub process_id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "containerId", deserialize_with = "de_opt_id")]
    pub container_id: Option<String>,
    pub external: bool,
}

impl WorkflowDefinition {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.process_id.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}

/// Container stub nested inside task type definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerRef {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
}

/// A task type definition. The canonical identifier is `categoryId`, which
/// is what TASK fields and task-creating actions reference; the internal
/// `id` is only a fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskTypeDefinition {
    #[serde(rename = "categoryId", deserialize_with = "de_opt_id")]
    pub category_id: Option<String>,
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    pub external: bool,
    pub container: Option<ContainerRef>,
    #[serde(rename = "formType")]
    pub form_type: Option<String>,
    #[serde(deserialize_with = "de_fields")]
    pub fields: BTreeMap<String, FieldDefinition>,
}

impl TaskTypeDefinition {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.category_id.as_deref().or(self.id.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }
}

/// A configured automation attached to a form or task type.
///
/// `parameters` stays a raw JSON value: its shape depends on the
/// consequence type, and the extractor skips it silently when it is not an
/// object.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ActionDefinition {
    #[serde(deserialize_with = "de_opt_id")]
    pub id: Option<String>,
    pub name: Option<String>,
    #[serde(rename = "consequenceType")]
    pub consequence_type: Option<String>,
    #[serde(rename = "triggerType")]
    pub trigger_type: Option<String>,
    #[serde(deserialize_with = "de_truthy")]
    pub automatic: bool,
    pub parameters: Value,
}

impl ActionDefinition {
    pub fn from_value(value: Value) -> Self {
        serde_json::from_value(value).unwrap_or_default()
    }
}

/// Common view the extractor needs from any field-bearing entity.
///
/// Task types are walked with the same extraction logic as forms; this
/// trait is the seam that makes that literal.
pub trait EntityDefinition {
    fn entity_id(&self) -> Option<&str>;
    fn entity_name(&self) -> &str;
    fn entity_fields(&self) -> &BTreeMap<String, FieldDefinition>;
}

impl EntityDefinition for FormDefinition {
    fn entity_id(&self) -> Option<&str> {
        self.id.as_deref().or(self.form_id.as_deref())
    }

    fn entity_name(&self) -> &str {
        self.name.as_deref().unwrap_or(UNKNOWN_NAME)
    }

    fn entity_fields(&self) -> &BTreeMap<String, FieldDefinition> {
        &self.fields
    }
}

impl EntityDefinition for TaskTypeDefinition {
    fn entity_id(&self) -> Option<&str> {
        TaskTypeDefinition::entity_id(self)
    }

    fn entity_name(&self) -> &str {
        self.display_name()
    }

    fn entity_fields(&self) -> &BTreeMap<String, FieldDefinition> {
        &self.fields
    }
}

/// What an action targets, decoded from the numeric `targetObjectType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionObjectType {
    CreateTask,
    CreateEntry,
    InvokeWorkflow,
    SqlReport,
    Email,
    EmailTemplate,
    EmailSchedule,
}

impl ActionObjectType {
    /// Decode the wire code. Unknown codes yield `None` and produce no
    /// relationship.
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            3 => Some(Self::CreateTask),
            5 => Some(Self::CreateEntry),
            9 => Some(Self::InvokeWorkflow),
            11 => Some(Self::SqlReport),
            16 => Some(Self::Email),
            21 => Some(Self::EmailTemplate),
            22 => Some(Self::EmailSchedule),
            _ => None,
        }
    }

    /// Report-and-email consequences never produce a cross-entity edge.
    pub fn is_skipped(self) -> bool {
        matches!(
            self,
            Self::SqlReport | Self::Email | Self::EmailTemplate | Self::EmailSchedule
        )
    }
}

/// What an action launches, decoded from the numeric `targetContainerType`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerTargetType {
    Template,
    Plan,
}

impl ContainerTargetType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            5 => Some(Self::Template),
            7 => Some(Self::Plan),
            _ => None,
        }
    }
}

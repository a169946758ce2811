//! Request bodies and query parameters for task calls

use super::TaskEntry;
use super::lookup::{coalesce, coalesce_string, is_standard_task_id};
use crate::utils::error::{BulkError, Result};
use serde_json::{Map, Value, json};
use std::collections::BTreeMap;

/// Optional create fields: target key and accepted source keys
const CREATE_FIELDS: &[(&str, &[&str])] = &[
    ("description", &["description"]),
    (
        "markdown_description",
        &["markdown_description", "markdownDescription"],
    ),
    ("status", &["status"]),
    ("priority", &["priority"]),
    ("parent", &["parent"]),
    ("tags", &["tags"]),
    ("assignees", &["assignees"]),
    ("due_date", &["due_date", "dueDate"]),
    ("start_date", &["start_date", "startDate"]),
];

const UPDATE_FIELDS: &[(&str, &[&str])] = &[
    ("name", &["name"]),
    ("description", &["description"]),
    (
        "markdown_description",
        &["markdown_description", "markdownDescription"],
    ),
    ("status", &["status"]),
    ("priority", &["priority"]),
    ("tags", &["tags"]),
    ("assignees", &["assignees"]),
    ("due_date", &["due_date", "dueDate"]),
    ("start_date", &["start_date", "startDate"]),
];

fn copy_fields(payload: &mut Map<String, Value>, entry: &TaskEntry, fields: &[(&str, &[&str])]) {
    for (target, sources) in fields {
        if let Some(value) = coalesce(entry, sources) {
            payload.insert((*target).to_string(), value.clone());
        }
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Body for creating a task; `name` is required
pub fn build_create_payload(entry: &TaskEntry) -> Result<Map<String, Value>> {
    let Some(name) = coalesce_string(entry, &["name"]) else {
        return Err(BulkError::invalid_parameter_with(
            "Task creation entry requires a name field.",
            json!({ "item": entry }),
        ));
    };

    let mut payload = Map::new();
    payload.insert("name".to_string(), Value::String(name));
    copy_fields(&mut payload, entry, CREATE_FIELDS);

    if let Some(custom_id) =
        coalesce_string(entry, &["custom_task_id", "customTaskId", "customId", "custom_id"])
    {
        payload.insert("custom_id".to_string(), Value::String(custom_id));
    }
    if let Some(notify_all) = coalesce(entry, &["notify_all", "notifyAll"]) {
        payload.insert("notify_all".to_string(), Value::Bool(truthy(notify_all)));
    }

    Ok(payload)
}

/// Body for updating a task; may be empty
pub fn build_update_payload(entry: &TaskEntry) -> Map<String, Value> {
    let mut payload = Map::new();
    copy_fields(&mut payload, entry, UPDATE_FIELDS);
    payload
}

/// Query parameters addressing one task
///
/// Custom ids need `custom_task_ids=true` and the team id. OAuth clients send
/// the team id for every call.
pub fn build_task_query(
    resolved_task_id: &str,
    custom_task_id: Option<&str>,
    team_id: Option<u64>,
    uses_oauth: bool,
) -> BTreeMap<String, String> {
    let mut query = BTreeMap::new();
    let use_custom = custom_task_id.is_some() || !is_standard_task_id(resolved_task_id);
    if use_custom {
        query.insert("custom_task_ids".to_string(), "true".to_string());
    }
    if let Some(team_id) = team_id {
        if use_custom || uses_oauth {
            query.insert("team_id".to_string(), team_id.to_string());
        }
    }
    query
}

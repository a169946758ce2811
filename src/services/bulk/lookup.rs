//! Identifier extraction from loosely-keyed task entries

use super::TaskEntry;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static STANDARD_TASK_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-z]{7,12}$").expect("task id pattern is valid")
});

const TASK_ID_KEYS: &[&str] = &["taskId", "task_id", "id"];
const CUSTOM_TASK_ID_KEYS: &[&str] = &["customTaskId", "custom_task_id", "customId", "custom_id"];
const TASK_NAME_KEYS: &[&str] = &["taskName", "task_name"];
pub(crate) const LIST_ID_KEYS: &[&str] = &["listId", "list_id"];
pub(crate) const LIST_NAME_KEYS: &[&str] = &["listName", "list_name"];

/// Whether `task_id` has the shape of a service-generated task id
pub fn is_standard_task_id(task_id: &str) -> bool {
    let trimmed = task_id.trim();
    !trimmed.is_empty() && STANDARD_TASK_ID.is_match(trimmed)
}

/// First present value among `keys`; null and empty strings count as absent
pub(crate) fn coalesce<'a>(entry: &'a TaskEntry, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| entry.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        })
}

/// Like [`coalesce`], rendered as a string
pub(crate) fn coalesce_string(entry: &TaskEntry, keys: &[&str]) -> Option<String> {
    coalesce(entry, keys).map(value_to_string)
}

pub(crate) fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Normalised identifier fields of one entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TaskLookup {
    pub task_id: Option<String>,
    pub task_name: Option<String>,
    pub list_id: Option<String>,
    pub list_name: Option<String>,
    pub custom_task_id: Option<String>,
}

impl TaskLookup {
    pub fn from_entry(entry: &TaskEntry) -> Self {
        let custom_task_id = coalesce_string(entry, CUSTOM_TASK_ID_KEYS);
        let task_id = coalesce_string(entry, TASK_ID_KEYS).or_else(|| custom_task_id.clone());

        Self {
            task_id,
            task_name: coalesce_string(entry, TASK_NAME_KEYS),
            list_id: coalesce_string(entry, LIST_ID_KEYS),
            list_name: coalesce_string(entry, LIST_NAME_KEYS),
            custom_task_id,
        }
    }

    /// The task id, if it is a standard one
    pub fn standard_task_id(&self) -> Option<&str> {
        self.task_id.as_deref().filter(|id| is_standard_task_id(id))
    }
}

//! Bulk operation service

use super::client::{ApiRequest, ClientError, HttpMethod, ResolveContext, ResourceKind, TaskClient};
use super::lookup::{LIST_ID_KEYS, LIST_NAME_KEYS, TaskLookup, coalesce_string};
use super::payload::{build_create_payload, build_task_query, build_update_payload};
use super::{BulkResult, TaskEntry};
use crate::config::BulkConfig;
use crate::core::batch::{
    BatchAborted, BatchOptions, BatchOverrides, ProgressSink, ProgressSnapshot, SchedulerContext,
    process_batch, run_blocking,
};
use crate::utils::error::{BulkError, Result};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::sync::Arc;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// A destination list given by id or by name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListSelector {
    pub list_id: Option<String>,
    pub list_name: Option<String>,
}

impl ListSelector {
    pub fn id(list_id: impl Into<String>) -> Self {
        Self {
            list_id: Some(list_id.into()),
            list_name: None,
        }
    }

    pub fn name(list_name: impl Into<String>) -> Self {
        Self {
            list_id: None,
            list_name: Some(list_name.into()),
        }
    }

    fn is_empty(&self) -> bool {
        blank(&self.list_id) && blank(&self.list_name)
    }
}

fn blank(value: &Option<String>) -> bool {
    value.as_deref().is_none_or(str::is_empty)
}

/// Supported bulk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOperation {
    CreateTasks,
    UpdateTasks,
    MoveTasks,
    DeleteTasks,
}

impl BulkOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateTasks => "create_bulk_tasks",
            Self::UpdateTasks => "update_bulk_tasks",
            Self::MoveTasks => "move_bulk_tasks",
            Self::DeleteTasks => "delete_bulk_tasks",
        }
    }
}

impl fmt::Display for BulkOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A high-level bulk request
#[derive(Debug, Clone)]
pub enum BulkRequest {
    /// Create tasks, each in its own list or in `default_list`
    Create {
        tasks: Vec<TaskEntry>,
        default_list: ListSelector,
        team_id: Option<u64>,
    },
    Update {
        tasks: Vec<TaskEntry>,
        team_id: Option<u64>,
    },
    /// Move tasks into `target_list`, which is required
    Move {
        tasks: Vec<TaskEntry>,
        target_list: ListSelector,
        team_id: Option<u64>,
    },
    Delete {
        tasks: Vec<TaskEntry>,
        team_id: Option<u64>,
    },
}

impl BulkRequest {
    pub fn operation(&self) -> BulkOperation {
        match self {
            Self::Create { .. } => BulkOperation::CreateTasks,
            Self::Update { .. } => BulkOperation::UpdateTasks,
            Self::Move { .. } => BulkOperation::MoveTasks,
            Self::Delete { .. } => BulkOperation::DeleteTasks,
        }
    }

    pub fn tasks(&self) -> &[TaskEntry] {
        match self {
            Self::Create { tasks, .. }
            | Self::Update { tasks, .. }
            | Self::Move { tasks, .. }
            | Self::Delete { tasks, .. } => tasks,
        }
    }

    fn team_id(&self) -> Option<u64> {
        match self {
            Self::Create { team_id, .. }
            | Self::Update { team_id, .. }
            | Self::Move { team_id, .. }
            | Self::Delete { team_id, .. } => *team_id,
        }
    }
}

/// An entry together with the single call that performs it
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedTask {
    pub entry: TaskEntry,
    pub request: ApiRequest,
}

/// Logs every snapshot before handing it to the caller's sink
struct LoggingProgress {
    operation: BulkOperation,
    run_id: Uuid,
    inner: Option<Arc<dyn ProgressSink>>,
}

#[async_trait]
impl ProgressSink for LoggingProgress {
    async fn on_progress(&self, snapshot: ProgressSnapshot) -> anyhow::Result<()> {
        debug!(
            operation = self.operation.as_str(),
            run_id = %self.run_id,
            completed = snapshot.completed,
            success = snapshot.success,
            failure = snapshot.failure,
            total = snapshot.total,
            "Bulk operation progress"
        );
        match &self.inner {
            Some(sink) => sink.on_progress(snapshot).await,
            None => Ok(()),
        }
    }
}

/// Concurrent task operations over a [`TaskClient`]
pub struct BulkService {
    client: Arc<dyn TaskClient>,
    defaults: BatchOptions,
}

impl BulkService {
    /// Create a service with default batch options
    pub fn new(client: Arc<dyn TaskClient>) -> Self {
        Self {
            client,
            defaults: BatchOptions::default(),
        }
    }

    /// Create a service whose batch defaults come from configuration
    pub fn from_config(client: Arc<dyn TaskClient>, config: &BulkConfig) -> Self {
        Self::new(client).with_defaults(config.batch_options())
    }

    /// Replace the process-wide batch defaults
    pub fn with_defaults(mut self, defaults: BatchOptions) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &BatchOptions {
        &self.defaults
    }

    /// Run `request` to completion
    ///
    /// Team and list resolution plus payload validation run first, on the
    /// blocking pool; any problem there is returned before a single item is
    /// dispatched. Per-item call failures are retried and then reported in
    /// `failed` with the original entry.
    pub async fn execute(&self, request: BulkRequest, overrides: &BatchOverrides) -> Result<BulkResult> {
        let operation = request.operation();
        let run_id = Uuid::new_v4();
        let span = info_span!("bulk_operation", operation = operation.as_str(), run_id = %run_id);
        self.run(operation, run_id, request, overrides)
            .instrument(span)
            .await
    }

    async fn run(
        &self,
        operation: BulkOperation,
        run_id: Uuid,
        request: BulkRequest,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        debug!(items = request.tasks().len(), "Preparing bulk operation");
        let client = Arc::clone(&self.client);
        let prepared =
            tokio::task::spawn_blocking(move || prepare(client.as_ref(), request)).await??;

        let options = self.effective_options(operation, run_id, overrides);
        let client = Arc::clone(&self.client);
        let outcome = process_batch(
            prepared,
            move |task: PreparedTask| dispatch(Arc::clone(&client), task.request),
            options,
        )
        .await;

        match outcome {
            Ok(result) => {
                let result = result.map_failed_items(|task| task.entry);
                info!(
                    operation = operation.as_str(),
                    run_id = %run_id,
                    success = result.totals.success,
                    failure = result.totals.failure,
                    total = result.totals.total,
                    "Bulk operation completed"
                );
                Ok(result)
            }
            Err(aborted) => {
                let partial = aborted.partial.map_failed_items(|task| task.entry);
                warn!(
                    operation = operation.as_str(),
                    run_id = %run_id,
                    success = partial.totals.success,
                    failure = partial.totals.failure,
                    total = partial.totals.total,
                    "Bulk operation halted"
                );
                Err(BatchAborted { partial }.into())
            }
        }
    }

    /// Run `request` from synchronous code
    ///
    /// `context` must describe the calling thread; use
    /// [`SchedulerContext::detect`] when unsure.
    pub fn execute_blocking(
        &self,
        context: SchedulerContext,
        request: BulkRequest,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        run_blocking(context, move || self.execute(request, overrides))?
    }

    pub fn create_bulk_tasks(
        &self,
        tasks: Vec<TaskEntry>,
        default_list: ListSelector,
        team_id: Option<u64>,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        let request = BulkRequest::Create {
            tasks,
            default_list,
            team_id,
        };
        self.execute_blocking(SchedulerContext::detect(), request, overrides)
    }

    pub fn update_bulk_tasks(
        &self,
        tasks: Vec<TaskEntry>,
        team_id: Option<u64>,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        let request = BulkRequest::Update { tasks, team_id };
        self.execute_blocking(SchedulerContext::detect(), request, overrides)
    }

    pub fn move_bulk_tasks(
        &self,
        tasks: Vec<TaskEntry>,
        target_list: ListSelector,
        team_id: Option<u64>,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        let request = BulkRequest::Move {
            tasks,
            target_list,
            team_id,
        };
        self.execute_blocking(SchedulerContext::detect(), request, overrides)
    }

    pub fn delete_bulk_tasks(
        &self,
        tasks: Vec<TaskEntry>,
        team_id: Option<u64>,
        overrides: &BatchOverrides,
    ) -> Result<BulkResult> {
        let request = BulkRequest::Delete { tasks, team_id };
        self.execute_blocking(SchedulerContext::detect(), request, overrides)
    }

    fn effective_options(
        &self,
        operation: BulkOperation,
        run_id: Uuid,
        overrides: &BatchOverrides,
    ) -> BatchOptions {
        let options = self.defaults.with_overrides(overrides);
        let inner = options.progress.clone();
        options.with_progress(Arc::new(LoggingProgress {
            operation,
            run_id,
            inner,
        }))
    }
}

/// Issue one call on the blocking pool
async fn dispatch(client: Arc<dyn TaskClient>, request: ApiRequest) -> std::result::Result<Value, ClientError> {
    let outcome = tokio::task::spawn_blocking(move || {
        let outcome = client.request_checked(&request);
        (request, outcome)
    })
    .await;

    match outcome {
        Ok((_, Ok(body))) => Ok(body),
        Ok((request, Err(error))) => {
            debug!(
                method = request.method.as_str(),
                path = %request.path,
                retryable = error.retryable(),
                error = %error,
                "Task call failed"
            );
            Err(error)
        }
        Err(join_error) => Err(ClientError::Other(format!("Request worker failed: {}", join_error))),
    }
}

/// Resolve identifiers and build one request per entry
fn prepare(client: &dyn TaskClient, request: BulkRequest) -> Result<Vec<PreparedTask>> {
    let team_id = ensure_team(client, request.team_id())?;
    let oauth = client.uses_oauth_authentication();

    match request {
        BulkRequest::Create {
            tasks, default_list, ..
        } => {
            let default_list_id = resolve_selector(client, &default_list, team_id)?;
            tasks
                .into_iter()
                .enumerate()
                .map(|(index, entry)| -> Result<PreparedTask> {
                    let list_id =
                        list_for_entry(client, &entry, index, default_list_id.as_deref(), team_id)?;
                    let body = build_create_payload(&entry)?;
                    let request = ApiRequest::new(HttpMethod::Post, format!("/list/{}/task", list_id))
                        .with_body(Value::Object(body))
                        .with_team_id(team_id);
                    Ok(PreparedTask { entry, request })
                })
                .collect()
        }
        BulkRequest::Update { tasks, .. } => tasks
            .into_iter()
            .enumerate()
            .map(|(index, entry)| -> Result<PreparedTask> {
                let (task_id, custom_id) = resolve_task(client, &entry, index, team_id)?;
                let body = build_update_payload(&entry);
                if body.is_empty() {
                    return Err(BulkError::invalid_parameter_with(
                        "Task update entry did not include any fields to modify.",
                        json!({ "item": entry, "index": index }),
                    ));
                }
                let query = build_task_query(&task_id, custom_id.as_deref(), team_id, oauth);
                let request = ApiRequest::new(HttpMethod::Put, format!("/task/{}", task_id))
                    .with_body(Value::Object(body))
                    .with_query(query)
                    .with_team_id(team_id);
                Ok(PreparedTask { entry, request })
            })
            .collect(),
        BulkRequest::Move {
            tasks, target_list, ..
        } => {
            let Some(target_list_id) = resolve_selector(client, &target_list, team_id)? else {
                return Err(BulkError::invalid_parameter(
                    "A destination list identifier or name must be supplied.",
                ));
            };
            tasks
                .into_iter()
                .enumerate()
                .map(|(index, entry)| -> Result<PreparedTask> {
                    let (task_id, custom_id) = resolve_task(client, &entry, index, team_id)?;
                    let query = build_task_query(&task_id, custom_id.as_deref(), team_id, oauth);
                    let request = ApiRequest::new(HttpMethod::Post, format!("/task/{}/move", task_id))
                        .with_body(json!({ "list_id": target_list_id }))
                        .with_query(query)
                        .with_team_id(team_id);
                    Ok(PreparedTask { entry, request })
                })
                .collect()
        }
        BulkRequest::Delete { tasks, .. } => tasks
            .into_iter()
            .enumerate()
            .map(|(index, entry)| -> Result<PreparedTask> {
                let (task_id, custom_id) = resolve_task(client, &entry, index, team_id)?;
                let query = build_task_query(&task_id, custom_id.as_deref(), team_id, oauth);
                let request = ApiRequest::new(HttpMethod::Delete, format!("/task/{}", task_id))
                    .with_query(query)
                    .with_team_id(team_id);
                Ok(PreparedTask { entry, request })
            })
            .collect(),
    }
}

fn ensure_team(client: &dyn TaskClient, team_id: Option<u64>) -> Result<Option<u64>> {
    client.ensure_team_id(team_id).map_err(|error| {
        debug!(error = %error, "Team resolution failed");
        BulkError::invalid_parameter_with(
            "Unable to determine ClickUp team identifier.",
            json!({ "team_id": team_id }),
        )
    })
}

/// Resolver failures become NOT_FOUND, or RATE_LIMIT when the service pushed back
fn resolution_error(error: ClientError, message: &str, mut context: Value) -> BulkError {
    if let Value::Object(map) = &mut context {
        map.insert("reason".to_string(), Value::String(error.to_string()));
    }
    match error {
        ClientError::RateLimited { retry_after, .. } => {
            if let Value::Object(map) = &mut context {
                map.insert(
                    "retry_after".to_string(),
                    json!(retry_after.map(|d| d.as_secs_f64())),
                );
            }
            BulkError::rate_limit_with(message, context)
        }
        _ => BulkError::not_found_with(message, context),
    }
}

fn resolve_list_name(
    client: &dyn TaskClient,
    list_name: &str,
    team_id: Option<u64>,
    message: &str,
    context: Value,
) -> Result<String> {
    let scope = ResolveContext {
        team_id,
        list_id: None,
    };
    client
        .resolve(ResourceKind::List, list_name, &scope)
        .map_err(|error| resolution_error(error, message, context))
}

fn resolve_selector(
    client: &dyn TaskClient,
    selector: &ListSelector,
    team_id: Option<u64>,
) -> Result<Option<String>> {
    if selector.is_empty() {
        return Ok(None);
    }
    if let Some(list_id) = selector.list_id.as_deref().filter(|id| !id.is_empty()) {
        return Ok(Some(list_id.to_string()));
    }
    let list_name = selector.list_name.as_deref().unwrap_or_default();
    resolve_list_name(
        client,
        list_name,
        team_id,
        "Unable to resolve list name provided for bulk operation.",
        json!({ "list_name": list_name }),
    )
    .map(Some)
}

fn list_for_entry(
    client: &dyn TaskClient,
    entry: &TaskEntry,
    index: usize,
    default_list_id: Option<&str>,
    team_id: Option<u64>,
) -> Result<String> {
    if let Some(list_id) = coalesce_string(entry, LIST_ID_KEYS) {
        return Ok(list_id);
    }
    if let Some(list_name) = coalesce_string(entry, LIST_NAME_KEYS) {
        let context = json!({ "list_name": list_name, "index": index });
        return resolve_list_name(
            client,
            &list_name,
            team_id,
            "Unable to resolve list name for task entry.",
            context,
        );
    }
    default_list_id.map(str::to_string).ok_or_else(|| {
        BulkError::invalid_parameter_with(
            "Each task must specify a list identifier when no default list is provided.",
            json!({ "item": entry, "index": index }),
        )
    })
}

/// Resolve the task an entry refers to, returning its id and custom id
fn resolve_task(
    client: &dyn TaskClient,
    entry: &TaskEntry,
    index: usize,
    team_id: Option<u64>,
) -> Result<(String, Option<String>)> {
    let lookup = TaskLookup::from_entry(entry);
    if let Some(task_id) = lookup.standard_task_id() {
        return Ok((task_id.trim().to_string(), lookup.custom_task_id));
    }

    let Some(task_name) = lookup.task_name.as_deref() else {
        // non-standard ids without a name are sent as custom ids
        return match lookup.task_id {
            Some(task_id) => Ok((task_id, lookup.custom_task_id)),
            None => Err(BulkError::invalid_parameter_with(
                "Task entry did not include enough information to identify the task.",
                json!({ "lookup": lookup, "index": index }),
            )),
        };
    };

    let list_id = match (&lookup.list_id, &lookup.list_name) {
        (Some(list_id), _) => Some(list_id.clone()),
        (None, Some(list_name)) => Some(resolve_list_name(
            client,
            list_name,
            team_id,
            "Unable to resolve list name for task entry.",
            json!({ "list_name": list_name, "index": index }),
        )?),
        (None, None) => None,
    };

    let scope = ResolveContext { team_id, list_id };
    let task_id = client
        .resolve(ResourceKind::Task, task_name, &scope)
        .map_err(|error| {
            resolution_error(
                error,
                "Unable to resolve task for bulk operation.",
                json!({ "lookup": lookup, "index": index }),
            )
        })?;
    Ok((task_id, lookup.custom_task_id))
}

//! Recording task client
//!
//! Implements [`TaskClient`] against in-memory tables, records every request
//! and tracks how many calls were in flight at once.

use clickup_bulk::{
    ApiRequest, ClientError, IdentifierResolver, ResolveContext, ResourceKind, TaskClient,
};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

#[derive(Default)]
pub struct RecordingClient {
    lists: HashMap<String, String>,
    tasks: HashMap<(Option<String>, String), String>,
    /// Remaining failures per path; `usize::MAX` fails forever
    failures: Mutex<HashMap<String, usize>>,
    latency: Duration,
    default_team: Option<u64>,
    oauth: bool,
    requests: Mutex<Vec<ApiRequest>>,
    resolutions: Mutex<Vec<(ResourceKind, String, ResolveContext)>>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl RecordingClient {
    pub fn new() -> Self {
        Self {
            default_team: Some(1234),
            ..Self::default()
        }
    }

    pub fn with_list(mut self, name: &str, id: &str) -> Self {
        self.lists.insert(name.to_string(), id.to_string());
        self
    }

    /// Register a task name, optionally scoped to a list id
    pub fn with_task(mut self, list_id: Option<&str>, name: &str, id: &str) -> Self {
        self.tasks
            .insert((list_id.map(str::to_string), name.to_string()), id.to_string());
        self
    }

    /// Fail calls to `path` the first `times` times
    pub fn failing(self, path: &str, times: usize) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(path.to_string(), times);
        self
    }

    pub fn always_failing(self, path: &str) -> Self {
        self.failing(path, usize::MAX)
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_oauth(mut self) -> Self {
        self.oauth = true;
        self
    }

    pub fn without_default_team(mut self) -> Self {
        self.default_team = None;
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.requests().into_iter().map(|r| r.path).collect();
        paths.sort();
        paths
    }

    pub fn resolutions(&self) -> Vec<(ResourceKind, String, ResolveContext)> {
        self.resolutions.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn peak_concurrency(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn take_failure(&self, path: &str) -> bool {
        let mut failures = self.failures.lock().unwrap();
        match failures.get_mut(path) {
            Some(0) | None => false,
            Some(remaining) => {
                if *remaining != usize::MAX {
                    *remaining -= 1;
                }
                true
            }
        }
    }
}

impl IdentifierResolver for RecordingClient {
    fn ensure_team_id(&self, team_id: Option<u64>) -> Result<Option<u64>, ClientError> {
        match team_id.or(self.default_team) {
            Some(team) => Ok(Some(team)),
            None => Err(ClientError::Other("No team configured".to_string())),
        }
    }

    fn resolve(
        &self,
        kind: ResourceKind,
        id_or_name: &str,
        context: &ResolveContext,
    ) -> Result<String, ClientError> {
        self.resolutions
            .lock()
            .unwrap()
            .push((kind, id_or_name.to_string(), context.clone()));

        let found = match kind {
            ResourceKind::List => self.lists.get(id_or_name),
            ResourceKind::Task => self
                .tasks
                .get(&(context.list_id.clone(), id_or_name.to_string()))
                .or_else(|| self.tasks.get(&(None, id_or_name.to_string()))),
        };
        found
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("{:?} '{}'", kind, id_or_name)))
    }
}

impl TaskClient for RecordingClient {
    fn request_checked(&self, request: &ApiRequest) -> Result<Value, ClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.latency.is_zero() {
            thread::sleep(self.latency);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.take_failure(&request.path) {
            return Err(ClientError::Transport(format!(
                "connection reset on {}",
                request.path
            )));
        }
        Ok(json!({
            "method": request.method.as_str(),
            "path": request.path,
            "body": request.body,
        }))
    }

    fn uses_oauth_authentication(&self) -> bool {
        self.oauth
    }
}

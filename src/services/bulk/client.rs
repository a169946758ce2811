//! External capabilities consumed by the bulk service

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Kind of resource an identifier refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    List,
    Task,
}

/// Scope used when resolving a name to an identifier
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveContext {
    pub team_id: Option<u64>,
    /// Restricts task lookups to one list
    pub list_id: Option<String>,
}

/// HTTP methods used by bulk operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single fully-resolved API call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub query: BTreeMap<String, String>,
    pub team_id: Option<u64>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            query: BTreeMap::new(),
            team_id: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    pub fn with_query(mut self, query: BTreeMap<String, String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_team_id(mut self, team_id: Option<u64>) -> Self {
        self.team_id = team_id;
        self
    }
}

/// Errors reported by a task client
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited: {message}")]
    RateLimited {
        message: String,
        retry_after: Option<Duration>,
    },

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Whether a later attempt could plausibly succeed
    ///
    /// Only used for logging; the batch engine retries every failure.
    pub fn retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::NotFound(_) | Self::Other(_) => false,
        }
    }
}

/// Resolves team and resource names to identifiers
///
/// Implementations perform blocking I/O; the service always calls them from
/// the blocking thread pool.
pub trait IdentifierResolver: Send + Sync {
    /// Resolve the team to use, falling back to a configured default
    fn ensure_team_id(&self, team_id: Option<u64>) -> Result<Option<u64>, ClientError>;

    /// Resolve `id_or_name` of the given kind to a canonical identifier
    fn resolve(
        &self,
        kind: ResourceKind,
        id_or_name: &str,
        context: &ResolveContext,
    ) -> Result<String, ClientError>;
}

/// Issues single API calls
pub trait TaskClient: IdentifierResolver {
    /// Perform `request`, returning the decoded body or an error for non-2xx responses
    fn request_checked(&self, request: &ApiRequest) -> Result<Value, ClientError>;

    /// OAuth clients must send the team id with every task call
    fn uses_oauth_authentication(&self) -> bool {
        false
    }
}

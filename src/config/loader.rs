//! Configuration loading from environment variables
//!
//! Numeric settings that fail to parse fall back to their defaults and parsed
//! values are clamped into range, so a bad environment never blocks startup.
//! Only a malformed team id is rejected.

use super::{BulkConfig, DEFAULT_RETRY_DELAY_SECS, MAX_RETRY_COUNT};
use crate::core::batch::{
    DEFAULT_BATCH_SIZE, DEFAULT_CONCURRENCY, DEFAULT_RETRY_COUNT, MAX_CONCURRENCY,
};
use crate::utils::error::{BulkError, Result};
use std::env;
use std::str::FromStr;
use tracing::{debug, warn};

pub const ENV_API_TOKEN: &str = "CLICKUP_API_TOKEN";
pub const ENV_TEAM_ID: &str = "CLICKUP_TEAM_ID";
pub const ENV_BATCH_SIZE: &str = "BULK_BATCH_SIZE";
pub const ENV_CONCURRENCY: &str = "BULK_CONCURRENCY";
pub const ENV_RETRY_COUNT: &str = "BULK_RETRY_COUNT";
pub const ENV_RETRY_DELAY: &str = "BULK_RETRY_DELAY_SEC";

impl BulkConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        debug!("Loading configuration from environment variables");
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default_team_id = match non_empty(lookup(ENV_TEAM_ID)) {
            Some(raw) => Some(raw.trim().parse::<u64>().map_err(|e| {
                BulkError::config(format!("Invalid {}: {}", ENV_TEAM_ID, e))
            })?),
            None => None,
        };

        let batch_size = parse_or_default(&lookup, ENV_BATCH_SIZE, DEFAULT_BATCH_SIZE).max(1);
        let concurrency = parse_or_default(&lookup, ENV_CONCURRENCY, DEFAULT_CONCURRENCY)
            .clamp(1, MAX_CONCURRENCY);
        let retry_count = parse_or_default::<i64, _>(
            &lookup,
            ENV_RETRY_COUNT,
            i64::from(DEFAULT_RETRY_COUNT),
        )
        .clamp(0, i64::from(MAX_RETRY_COUNT)) as u32;
        let retry_delay_secs =
            parse_or_default(&lookup, ENV_RETRY_DELAY, DEFAULT_RETRY_DELAY_SECS);
        let retry_delay_secs = if retry_delay_secs.is_finite() {
            retry_delay_secs.max(0.0)
        } else {
            DEFAULT_RETRY_DELAY_SECS
        };

        Ok(Self {
            api_token: non_empty(lookup(ENV_API_TOKEN)),
            default_team_id,
            batch_size,
            concurrency,
            retry_count,
            retry_delay_secs,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or_default<T, F>(lookup: &F, key: &str, default: T) -> T
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match non_empty(lookup(key)) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring unparsable setting");
            default
        }),
        None => default,
    }
}

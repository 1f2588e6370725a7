use crate::model::MAX_BATCH_SIZE;
use crate::pattern::classifier::DEFAULT_ACTIVITY_PREFIX;
use crate::pattern::timeout::DEFAULT_TIMEOUT_PATTERN;
use crate::sink::dispatcher::DEFAULT_NAMESPACE;
use crate::sink::RetryPolicy;
use crate::store::default_segments;
use crate::visits::{DEFAULT_ACTIVITY_TYPE, DEFAULT_STALE_AFTER};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Environment variable naming the deployment environment.
pub const ENVIRONMENT_VAR: &str = "BRANCH";
pub const DEFAULT_ENVIRONMENT: &str = "local";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Deployment environment; falls back to `$BRANCH`, then `local`.
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub activities: ActivitiesConfig,
    #[serde(default)]
    pub timeouts: TimeoutsConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Config {
    /// Lowercased environment name used to tag every metric point.
    pub fn resolved_environment(&self) -> String {
        self.environment
            .clone()
            .filter(|env| !env.trim().is_empty())
            .or_else(|| std::env::var(ENVIRONMENT_VAR).ok())
            .filter(|env| !env.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string())
            .trim()
            .to_lowercase()
    }

    pub fn table_name(&self) -> String {
        match &self.activities.table {
            Some(table) => table.clone(),
            None => format!("cvs-{}-activities", self.resolved_environment()),
        }
    }

    pub fn scan_segments(&self) -> usize {
        self.activities
            .scan_segments
            .unwrap_or_else(default_segments)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActivitiesConfig {
    #[serde(default = "default_log_group_prefix")]
    pub log_group_prefix: String,
    /// Defaults to `cvs-<environment>-activities`.
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default = "default_activity_type")]
    pub activity_type: String,
    #[serde(default = "default_stale_after", with = "humantime_serde")]
    pub stale_after: Duration,
    /// Defaults to the number of available CPUs.
    #[serde(default)]
    pub scan_segments: Option<usize>,
}

impl Default for ActivitiesConfig {
    fn default() -> Self {
        Self {
            log_group_prefix: default_log_group_prefix(),
            table: None,
            activity_type: default_activity_type(),
            stale_after: default_stale_after(),
            scan_segments: None,
        }
    }
}

fn default_log_group_prefix() -> String {
    DEFAULT_ACTIVITY_PREFIX.to_string()
}

fn default_activity_type() -> String {
    DEFAULT_ACTIVITY_TYPE.to_string()
}

fn default_stale_after() -> Duration {
    DEFAULT_STALE_AFTER
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutsConfig {
    #[serde(default = "default_timeout_pattern")]
    pub pattern: String,
}

impl Default for TimeoutsConfig {
    fn default() -> Self {
        Self {
            pattern: default_timeout_pattern(),
        }
    }
}

fn default_timeout_pattern() -> String {
    DEFAULT_TIMEOUT_PATTERN.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            max_batch_size: default_max_batch_size(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_base_delay", with = "humantime_serde")]
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay: default_base_delay(),
        }
    }
}

fn default_max_attempts() -> usize {
    RetryPolicy::default().max_attempts
}

fn default_base_delay() -> Duration {
    RetryPolicy::default().base_delay
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        RetryPolicy {
            max_attempts: config.max_attempts,
            base_delay: config.base_delay,
        }
    }
}

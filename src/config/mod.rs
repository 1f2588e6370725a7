pub mod parse;
pub mod types;

use regex::Regex;
use std::sync::LazyLock;

pub use parse::{load_config, parse_config, ConfigError};
pub use types::{ActivitiesConfig, Config, MetricsConfig, RetryConfig, TimeoutsConfig};

#[allow(clippy::expect_used)]
static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$env\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid")
});

/// Expands environment variables in a string.
/// Supports $env{VAR_NAME} syntax.
/// If an environment variable is not set, it's left unchanged.
pub fn expand_env_vars(text: &str) -> String {
    ENV_VAR_PATTERN
        .replace_all(text, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .to_string()
}

/// Names of `$env{...}` references still present in `text`, sorted and deduplicated.
pub fn unexpanded_env_vars(text: &str) -> Vec<String> {
    let mut vars: Vec<String> = ENV_VAR_PATTERN
        .captures_iter(text)
        .map(|caps| caps[1].to_string())
        .collect();
    vars.sort();
    vars.dedup();
    vars
}

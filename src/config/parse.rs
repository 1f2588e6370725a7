use super::types::*;
use super::{expand_env_vars, unexpanded_env_vars};
use crate::model::MAX_BATCH_SIZE;
use crate::pattern::TimeoutCounter;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation failed:\n{}", .0.join("\n"))]
    ValidationList(Vec<String>),

    #[error("validation failed: {0}")]
    Validation(String),
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let yaml_string = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::Io(std::io::Error::new(
            e.kind(),
            format!("failed to read config file '{}': {}", path.display(), e),
        ))
    })?;

    parse_config(&yaml_string)
}

/// Parse and validate a YAML config document.
///
/// `$env{VAR}` references are expanded first; any left unexpanded are an error.
pub fn parse_config(yaml: &str) -> Result<Config, ConfigError> {
    let yaml_string = expand_env_vars(yaml);
    check_unexpanded_vars(&yaml_string)?;

    // An empty document means "all defaults"
    let config: Config = if yaml_string.trim().is_empty() {
        Config::default()
    } else {
        serde_yaml::from_str(&yaml_string)?
    };

    validate_config(&config)?;
    Ok(config)
}

fn check_unexpanded_vars(yaml_string: &str) -> Result<(), ConfigError> {
    let vars = unexpanded_env_vars(yaml_string);
    if vars.is_empty() {
        return Ok(());
    }

    Err(ConfigError::Validation(format!(
        "environment variables are not set: {}\n\
         \n\
         Set them before starting, or replace the $env{{...}} references with literal values",
        vars.join(", ")
    )))
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let mut errors = Vec::new();

    if config.activities.log_group_prefix.is_empty() {
        errors.push("activities.log_group_prefix cannot be empty".to_string());
    }

    if config.activities.activity_type.is_empty() {
        errors.push("activities.activity_type cannot be empty".to_string());
    }

    if let Some(table) = &config.activities.table {
        if table.is_empty() {
            errors.push("activities.table cannot be empty when set".to_string());
        }
    }

    if config.activities.scan_segments == Some(0) {
        errors.push("activities.scan_segments must be at least 1".to_string());
    }

    if config.timeouts.pattern.is_empty() {
        errors.push("timeouts.pattern cannot be empty".to_string());
    } else if let Err(e) = TimeoutCounter::new(&config.timeouts.pattern) {
        errors.push(format!("timeouts.pattern: {}", e));
    }

    if config.metrics.namespace.is_empty() {
        errors.push("metrics.namespace cannot be empty".to_string());
    }

    if config.metrics.max_batch_size == 0 || config.metrics.max_batch_size > MAX_BATCH_SIZE {
        errors.push(format!(
            "metrics.max_batch_size must be between 1 and {}, got {}",
            MAX_BATCH_SIZE, config.metrics.max_batch_size
        ));
    }

    if config.metrics.retry.max_attempts == 0 {
        errors.push("metrics.retry.max_attempts must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationList(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.metrics.namespace, "CVS");
        assert_eq!(config.activities.stale_after, Duration::from_secs(10 * 3600));
    }

    #[test]
    fn test_expands_env_vars() {
        std::env::set_var("METRICS_PARSE_TEST_ENV", "cvsb-42");
        let config = parse_config("environment: $env{METRICS_PARSE_TEST_ENV}\n").unwrap();
        std::env::remove_var("METRICS_PARSE_TEST_ENV");

        assert_eq!(config.environment.as_deref(), Some("cvsb-42"));
        assert_eq!(config.table_name(), "cvs-cvsb-42-activities");
    }

    #[test]
    fn test_unexpanded_var_is_rejected() {
        let err = parse_config("environment: $env{METRICS_PARSE_TEST_UNSET}\n").unwrap_err();
        match err {
            ConfigError::Validation(msg) => assert!(msg.contains("METRICS_PARSE_TEST_UNSET")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_collects_all_validation_errors() {
        let yaml = r#"
activities:
  scan_segments: 0
timeouts:
  pattern: "(unclosed"
metrics:
  max_batch_size: 50
  retry:
    max_attempts: 0
"#;
        match parse_config(yaml).unwrap_err() {
            ConfigError::ValidationList(errors) => {
                assert_eq!(errors.len(), 4, "{errors:?}");
                assert!(errors.iter().any(|e| e.contains("scan_segments")));
                assert!(errors.iter().any(|e| e.contains("timeouts.pattern")));
                assert!(errors.iter().any(|e| e.contains("max_batch_size")));
                assert!(errors.iter().any(|e| e.contains("max_attempts")));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_yaml() {
        let err = parse_config("activities: [").unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse(_)));
    }

    #[test]
    fn test_invalid_duration() {
        let err = parse_config("activities:\n  stale_after: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::YamlParse(_)));
    }
}

pub mod classifier;
pub mod timeout;

use thiserror::Error;

pub use classifier::ServiceClassifier;
pub use timeout::TimeoutCounter;

/// Error type for configured pattern compilation
#[derive(Debug, Error)]
pub enum PatternError {
    #[error("regex compilation error for pattern '{pattern}': {source}")]
    RegexCompilation {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

pub(crate) fn compile(pattern: &str) -> Result<regex::Regex, PatternError> {
    regex::Regex::new(pattern).map_err(|e| PatternError::RegexCompilation {
        pattern: pattern.to_string(),
        source: e,
    })
}

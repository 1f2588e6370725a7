use super::{compile, PatternError};
use regex::Regex;

/// Log group naming prefix of the activities service functions.
pub const DEFAULT_ACTIVITY_PREFIX: &str = "/aws/lambda/activities-";

/// Decides whether a log group belongs to the activity service.
///
/// A group matches when it starts with the configured prefix followed by a
/// non-empty environment qualifier made of word characters and dashes.
#[derive(Debug, Clone)]
pub struct ServiceClassifier {
    pattern: Regex,
}

impl ServiceClassifier {
    pub fn for_prefix(prefix: &str) -> Result<Self, PatternError> {
        let source = format!(r"^{}[\w-]+", regex::escape(prefix));
        Ok(Self {
            pattern: compile(&source)?,
        })
    }

    pub fn is_activity(&self, service_group_id: &str) -> bool {
        self.pattern.is_match(service_group_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> ServiceClassifier {
        ServiceClassifier::for_prefix(DEFAULT_ACTIVITY_PREFIX).unwrap()
    }

    #[test]
    fn test_matches_environment_qualified_groups() {
        let c = classifier();
        assert!(c.is_activity("/aws/lambda/activities-develop"));
        assert!(c.is_activity("/aws/lambda/activities-cvsb-1234"));
    }

    #[test]
    fn test_rejects_other_groups() {
        let c = classifier();
        assert!(!c.is_activity("testLogGroup"));
        assert!(!c.is_activity("/aws/lambda/test-results-develop"));
        assert!(!c.is_activity("/aws/lambda/activities-"));
        assert!(!c.is_activity("prefix/aws/lambda/activities-develop"));
    }

    #[test]
    fn test_prefix_is_literal() {
        let c = ServiceClassifier::for_prefix("svc.a-").unwrap();
        assert!(c.is_activity("svc.a-prod"));
        assert!(!c.is_activity("svcXa-prod"));
    }
}

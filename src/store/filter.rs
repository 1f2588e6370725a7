use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Encode a timestamp the way the activities table stores it.
///
/// Millisecond precision with a literal `Z`, so lexical order matches time order.
pub fn store_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ExpressionValue {
    #[serde(rename = "S")]
    String(String),
    #[serde(rename = "NULL")]
    Null(bool),
}

/// A single clause of a scan filter over activity records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Condition {
    /// `startTime >= value`, compared lexically in store timestamp encoding.
    StartTimeAtOrAfter(String),
    /// `startTime <= value`
    StartTimeAtOrBefore(String),
    EndTimeUnset,
    ActivityType(String),
}

impl Condition {
    fn placeholder(&self) -> &'static str {
        match self {
            Condition::StartTimeAtOrAfter(_) => ":startFrom",
            Condition::StartTimeAtOrBefore(_) => ":startUntil",
            Condition::EndTimeUnset => ":NULL",
            Condition::ActivityType(_) => ":activityType",
        }
    }

    fn clause(&self) -> String {
        let placeholder = self.placeholder();
        match self {
            Condition::StartTimeAtOrAfter(_) => format!("startTime >= {}", placeholder),
            Condition::StartTimeAtOrBefore(_) => format!("startTime <= {}", placeholder),
            Condition::EndTimeUnset => format!("endTime = {}", placeholder),
            Condition::ActivityType(_) => format!("activityType = {}", placeholder),
        }
    }

    fn value(&self) -> ExpressionValue {
        match self {
            Condition::StartTimeAtOrAfter(v)
            | Condition::StartTimeAtOrBefore(v)
            | Condition::ActivityType(v) => ExpressionValue::String(v.clone()),
            Condition::EndTimeUnset => ExpressionValue::Null(true),
        }
    }
}

/// Conjunction of conditions evaluated by the store against one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanFilter {
    pub table: String,
    pub conditions: Vec<Condition>,
}

impl ScanFilter {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            conditions: Vec::new(),
        }
    }

    pub fn with(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Filter expression in the store's native syntax.
    pub fn expression(&self) -> String {
        self.conditions
            .iter()
            .map(Condition::clause)
            .collect::<Vec<_>>()
            .join(" and ")
    }

    /// Values bound to the placeholders used by [`expression`](Self::expression).
    pub fn expression_values(&self) -> BTreeMap<String, ExpressionValue> {
        self.conditions
            .iter()
            .map(|c| (c.placeholder().to_string(), c.value()))
            .collect()
    }
}

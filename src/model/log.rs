use serde::{Deserialize, Serialize};

/// A single event from a log stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "timestamp", default)]
    pub timestamp_millis: i64,
    #[serde(default)]
    pub message: String,
}

impl LogLine {
    pub fn new(id: impl Into<String>, timestamp_millis: i64, message: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            timestamp_millis,
            message: message.into(),
        }
    }
}

/// One decoded subscription payload.
///
/// Field names follow the log subscription document so a payload can be
/// deserialized directly; `logGroup` identifies the originating service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogBatch {
    #[serde(rename = "logGroup")]
    pub service_group_id: String,

    #[serde(rename = "logEvents", default)]
    pub events: Vec<LogLine>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_stream: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subscription_filters: Vec<String>,
}

impl LogBatch {
    pub fn new(service_group_id: impl Into<String>, events: Vec<LogLine>) -> Self {
        Self {
            service_group_id: service_group_id.into(),
            events,
            message_type: None,
            owner: None,
            log_stream: None,
            subscription_filters: Vec::new(),
        }
    }
}

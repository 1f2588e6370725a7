use serde::{Deserialize, Serialize};

/// A raw record as delivered by the batch trigger.
///
/// `data` is the encoded payload; it is handed back untouched in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRecord {
    pub record_id: String,
    pub data: String,
}

impl InputRecord {
    pub fn new(record_id: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            data: data.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordStatus {
    Ok,
    ProcessingFailed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordOutcome {
    pub record_id: String,
    #[serde(rename = "result")]
    pub status: RecordStatus,
    #[serde(rename = "data")]
    pub original_data: String,
}

impl RecordOutcome {
    pub fn for_record(record: &InputRecord, status: RecordStatus) -> Self {
        Self {
            record_id: record.record_id.clone(),
            status,
            original_data: record.data.clone(),
        }
    }
}

/// Envelope of records delivered by the stream transformation trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationEvent {
    #[serde(default)]
    pub records: Vec<InputRecord>,
}

/// Envelope returned to the stream transformation trigger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformationResult {
    pub records: Vec<RecordOutcome>,
}

use super::filter::ScanFilter;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("scan request for segment {segment} failed: {message}")]
    Request { segment: usize, message: String },

    #[error("invalid continuation token: {0}")]
    InvalidToken(String),
}

/// Opaque cursor returned by the store when a segment has more pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuationToken(pub String);

/// A count-only scan request for one segment of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanQuery {
    pub filter: ScanFilter,
    pub segment: usize,
    pub total_segments: usize,
    pub continuation: Option<ContinuationToken>,
}

impl ScanQuery {
    pub fn new(filter: ScanFilter, segment: usize, total_segments: usize) -> Self {
        Self {
            filter,
            segment,
            total_segments,
            continuation: None,
        }
    }
}

/// One page of a count-only scan.
///
/// A missing `count` contributes nothing; a missing `next_token` ends the segment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    pub count: Option<u64>,
    pub next_token: Option<ContinuationToken>,
}

#[async_trait]
pub trait CountingStore: Send + Sync {
    async fn scan_page(&self, query: &ScanQuery) -> Result<ScanPage, StoreError>;
}

use crate::model::MetricBatch;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("metrics backend rejected batch with status {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("metrics transport error: {0}")]
    Transport(String),

    #[error("batch of {size} points exceeds the backend limit of {max}")]
    BatchTooLarge { size: usize, max: usize },

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted {
        attempts: usize,
        #[source]
        last: Box<SinkError>,
    },
}

impl SinkError {
    /// Errors that will fail again no matter how often the batch is resent.
    pub fn is_permanent(&self) -> bool {
        match self {
            SinkError::Rejected { status, .. } => (400..500).contains(status),
            SinkError::BatchTooLarge { .. } => true,
            SinkError::Transport(_) | SinkError::RetriesExhausted { .. } => false,
        }
    }
}

/// Destination for metric batches.
#[async_trait]
pub trait MetricsSink: Send + Sync {
    async fn put_batch(&self, batch: &MetricBatch) -> Result<(), SinkError>;
}

#[async_trait]
impl<S: MetricsSink + ?Sized> MetricsSink for Arc<S> {
    async fn put_batch(&self, batch: &MetricBatch) -> Result<(), SinkError> {
        (**self).put_batch(batch).await
    }
}

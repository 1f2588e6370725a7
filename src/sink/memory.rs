use super::traits::{MetricsSink, SinkError};
use crate::model::{MetricBatch, MetricPoint, MAX_BATCH_SIZE};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Sink that keeps every accepted batch in memory.
///
/// Queued failures are returned, one per call, before batches are accepted again.
/// Batches above the backend limit are refused like the real backend would.
#[derive(Default)]
pub struct RecordingSink {
    batches: Mutex<Vec<MetricBatch>>,
    failures: Mutex<VecDeque<SinkError>>,
    calls: AtomicUsize,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_failure(&self, error: SinkError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push_back(error);
        }
    }

    pub fn batches(&self) -> Vec<MetricBatch> {
        self.batches.lock().map(|b| b.clone()).unwrap_or_default()
    }

    pub fn points(&self) -> Vec<MetricPoint> {
        self.batches()
            .into_iter()
            .flat_map(|batch| batch.points)
            .collect()
    }

    /// Number of `put_batch` calls, including failed ones.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricsSink for RecordingSink {
    async fn put_batch(&self, batch: &MetricBatch) -> Result<(), SinkError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failures.lock().ok().and_then(|mut f| f.pop_front()) {
            return Err(error);
        }

        if batch.len() > MAX_BATCH_SIZE {
            return Err(SinkError::BatchTooLarge {
                size: batch.len(),
                max: MAX_BATCH_SIZE,
            });
        }

        if let Ok(mut batches) = self.batches.lock() {
            batches.push(batch.clone());
        }
        Ok(())
    }
}

use super::traits::{MetricsSink, SinkError};
use crate::model::MetricBatch;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{error, warn};

const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: usize,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Resends failed batches with exponential backoff.
///
/// Permanent errors are returned immediately.
pub struct RetryingSink<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: MetricsSink> RetryingSink<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: MetricsSink> MetricsSink for RetryingSink<S> {
    async fn put_batch(&self, batch: &MetricBatch) -> Result<(), SinkError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;
        let mut backoff = self.policy.base_delay;

        loop {
            match self.inner.put_batch(batch).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_permanent() => {
                    error!(error = %e, points = batch.len(), "Metric batch rejected");
                    return Err(e);
                }
                Err(e) => {
                    attempts += 1;
                    if attempts >= max_attempts {
                        error!(
                            attempts,
                            error = %e,
                            points = batch.len(),
                            "Max retries exceeded"
                        );
                        return Err(SinkError::RetriesExhausted {
                            attempts,
                            last: Box::new(e),
                        });
                    }

                    warn!(
                        attempt = attempts,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Metric batch dispatch failed, retrying"
                    );

                    tokio::time::sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, MAX_BACKOFF);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use std::sync::Arc;

    fn policy(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(1),
        }
    }

    fn batch() -> MetricBatch {
        MetricBatch {
            namespace: "CVS".into(),
            points: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_recovers_from_transient_failures() {
        let recorder = Arc::new(RecordingSink::new());
        recorder.push_failure(SinkError::Transport("reset".into()));
        recorder.push_failure(SinkError::Rejected {
            status: 500,
            message: "oops".into(),
        });

        let sink = RetryingSink::new(recorder.clone(), policy(3));
        sink.put_batch(&batch()).await.unwrap();

        assert_eq!(recorder.calls(), 3);
        assert_eq!(recorder.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let recorder = Arc::new(RecordingSink::new());
        for _ in 0..5 {
            recorder.push_failure(SinkError::Transport("down".into()));
        }

        let sink = RetryingSink::new(recorder.clone(), policy(2));
        let err = sink.put_batch(&batch()).await.unwrap_err();

        assert!(matches!(err, SinkError::RetriesExhausted { attempts: 2, .. }));
        assert_eq!(recorder.calls(), 2);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let recorder = Arc::new(RecordingSink::new());
        recorder.push_failure(SinkError::Rejected {
            status: 403,
            message: "denied".into(),
        });

        let sink = RetryingSink::new(recorder.clone(), policy(5));
        let err = sink.put_batch(&batch()).await.unwrap_err();

        assert!(matches!(err, SinkError::Rejected { status: 403, .. }));
        assert_eq!(recorder.calls(), 1);
    }
}

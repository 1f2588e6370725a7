use super::PipelineError;
use crate::config::Config;
use crate::decode::Decoder;
use crate::model::{
    InputRecord, LogBatch, RecordOutcome, RecordStatus, TransformationEvent,
    TransformationResult, VisitCounts,
};
use crate::pattern::{ServiceClassifier, TimeoutCounter};
use crate::sink::{DispatchSettings, MetricDispatcher, MetricsSink, RetryPolicy, RetryingSink};
use crate::store::{CountingStore, SegmentedCounter};
use crate::visits::{VisitAggregator, VisitSettings};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, Instrument};

/// External clients the orchestrator drives.
#[derive(Clone)]
pub struct Collaborators {
    pub decoder: Arc<dyn Decoder>,
    pub store: Arc<dyn CountingStore>,
    pub sink: Arc<dyn MetricsSink>,
}

/// What one successful pass produced.
#[derive(Debug, Clone, Default, PartialEq)]
struct PassSummary {
    batches: usize,
    visits: Option<VisitCounts>,
    timeouts: u64,
    points: usize,
}

/// Entry point for a batch of streamed log records.
///
/// Decodes every record, counts timeouts per log group, runs the visit
/// aggregation at most once per call and ships all resulting points. The
/// records themselves are echoed back untouched: all `Ok` on success, all
/// `ProcessingFailed` if anything in the pass failed.
pub struct BatchOrchestrator {
    decoder: Arc<dyn Decoder>,
    counter: Arc<SegmentedCounter>,
    sink: Arc<dyn MetricsSink>,
    classifier: ServiceClassifier,
    timeouts: TimeoutCounter,
    visits: VisitSettings,
    dispatch: DispatchSettings,
}

impl BatchOrchestrator {
    pub fn from_config(
        config: &Config,
        collaborators: Collaborators,
    ) -> Result<Self, PipelineError> {
        let environment = config.resolved_environment();
        let retry = RetryPolicy::from(&config.metrics.retry);

        let orchestrator = Self {
            decoder: collaborators.decoder,
            counter: Arc::new(SegmentedCounter::new(
                collaborators.store,
                config.scan_segments(),
            )),
            sink: Arc::new(RetryingSink::new(collaborators.sink, retry)),
            classifier: ServiceClassifier::for_prefix(&config.activities.log_group_prefix)?,
            timeouts: TimeoutCounter::new(&config.timeouts.pattern)?,
            visits: VisitSettings {
                table: config.table_name(),
                activity_type: config.activities.activity_type.clone(),
                stale_after: config.activities.stale_after,
            },
            dispatch: DispatchSettings {
                namespace: config.metrics.namespace.clone(),
                environment: environment.clone(),
                max_batch_size: config.metrics.max_batch_size,
            },
        };

        info!(
            environment = %environment,
            table = %orchestrator.visits.table,
            segments = orchestrator.counter.segments(),
            retry_attempts = retry.max_attempts,
            "Batch orchestrator initialized"
        );

        Ok(orchestrator)
    }

    /// Process a transformation event, returning one result per record in order.
    pub async fn process_event(&self, event: &TransformationEvent) -> TransformationResult {
        TransformationResult {
            records: self.process_batch(&event.records).await,
        }
    }

    pub async fn process_batch(&self, records: &[InputRecord]) -> Vec<RecordOutcome> {
        self.process_batch_at(records, Utc::now()).await
    }

    /// Like [`process_batch`](Self::process_batch) with an explicit invocation time.
    pub async fn process_batch_at(
        &self,
        records: &[InputRecord],
        now: DateTime<Utc>,
    ) -> Vec<RecordOutcome> {
        let status = match self.run(records, now).await {
            Ok(summary) => {
                info!(
                    records = records.len(),
                    batches = summary.batches,
                    timeouts = summary.timeouts,
                    points = summary.points,
                    visits = ?summary.visits,
                    "Batch processed"
                );
                RecordStatus::Ok
            }
            Err(e) => {
                error!(error = %e, records = records.len(), "Batch processing failed");
                let ids: Vec<&str> = records.iter().map(|r| r.record_id.as_str()).collect();
                info!(record_ids = ?ids, "Marking every record as failed");
                RecordStatus::ProcessingFailed
            }
        };

        records
            .iter()
            .map(|record| RecordOutcome::for_record(record, status))
            .collect()
    }

    async fn run(
        &self,
        records: &[InputRecord],
        now: DateTime<Utc>,
    ) -> Result<PassSummary, PipelineError> {
        let batches = self
            .decode_all(records)
            .instrument(info_span!("decode_event", records = records.len()))
            .await?;

        let aggregator = VisitAggregator::new(Arc::clone(&self.counter), self.visits.clone(), now);
        let dispatcher = MetricDispatcher::new(Arc::clone(&self.sink), self.dispatch.clone(), now);

        let mut summary = PassSummary {
            batches: batches.len(),
            ..PassSummary::default()
        };
        let mut points = Vec::with_capacity(batches.len() + 3);

        // Only the first activity-service batch of this call triggers the visit scan
        let mut visits_collected = false;

        for batch in &batches {
            if !visits_collected && self.classifier.is_activity(&batch.service_group_id) {
                debug!(service = %batch.service_group_id, "Activity log group, collecting visits");
                let counts = aggregator
                    .collect()
                    .instrument(info_span!("get_visit_stats"))
                    .await?;
                points.extend(dispatcher.visit_points(&counts));
                summary.visits = Some(counts);
                visits_collected = true;
            }

            let timeouts = self.timeouts.count(&batch.events);
            debug!(
                service = %batch.service_group_id,
                lines = batch.events.len(),
                timeouts,
                "Counted timeouts"
            );
            summary.timeouts += timeouts;
            points.push(dispatcher.timeout_point(&batch.service_group_id, timeouts));
        }

        summary.points = points.len();
        dispatcher
            .send_counts(points)
            .instrument(info_span!("send_metrics"))
            .await?;

        Ok(summary)
    }

    async fn decode_all(&self, records: &[InputRecord]) -> Result<Vec<LogBatch>, PipelineError> {
        let decodes = records
            .iter()
            .map(|record| self.decoder.decode(record.data.as_bytes()));
        let batches = try_join_all(decodes).await?;
        debug!(batches = batches.len(), "Decoded records");
        Ok(batches)
    }
}

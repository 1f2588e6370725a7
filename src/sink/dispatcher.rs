use super::traits::{MetricsSink, SinkError};
use crate::model::metric::{ENVIRONMENT_DIMENSION, SERVICE_DIMENSION};
use crate::model::{Dimension, MetricBatch, MetricPoint, Unit, VisitCounts, MAX_BATCH_SIZE};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::{debug, info};

pub const DEFAULT_NAMESPACE: &str = "CVS";

pub const VISITS_TODAY_METRIC: &str = "VisitsToday";
pub const OLD_VISITS_METRIC: &str = "OldVisits";
pub const OPEN_VISITS_METRIC: &str = "OpenVisits";
pub const TIMEOUTS_METRIC: &str = "Timeouts";

#[derive(Debug, Clone)]
pub struct DispatchSettings {
    pub namespace: String,
    pub environment: String,
    pub max_batch_size: usize,
}

impl DispatchSettings {
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            namespace: DEFAULT_NAMESPACE.to_string(),
            environment: environment.into(),
            max_batch_size: MAX_BATCH_SIZE,
        }
    }
}

/// Builds metric points for one invocation and ships them in batches.
///
/// Every point carries the same timestamp and the `Environment` dimension.
pub struct MetricDispatcher {
    sink: Arc<dyn MetricsSink>,
    settings: DispatchSettings,
    timestamp: DateTime<Utc>,
}

impl MetricDispatcher {
    pub fn new(
        sink: Arc<dyn MetricsSink>,
        settings: DispatchSettings,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            sink,
            settings,
            timestamp,
        }
    }

    fn point(&self, name: &str, value: u64, extra: Option<Dimension>) -> MetricPoint {
        let mut dimensions = vec![Dimension::new(
            ENVIRONMENT_DIMENSION,
            self.settings.environment.as_str(),
        )];
        dimensions.extend(extra);

        MetricPoint {
            name: name.to_string(),
            dimensions,
            timestamp: self.timestamp,
            value: value as f64,
            unit: Unit::Count,
        }
    }

    pub fn visit_points(&self, counts: &VisitCounts) -> Vec<MetricPoint> {
        vec![
            self.point(VISITS_TODAY_METRIC, counts.visits_today, None),
            self.point(OLD_VISITS_METRIC, counts.stale_open_visits, None),
            self.point(OPEN_VISITS_METRIC, counts.open_visits, None),
        ]
    }

    pub fn timeout_point(&self, service: &str, timeouts: u64) -> MetricPoint {
        self.point(
            TIMEOUTS_METRIC,
            timeouts,
            Some(Dimension::new(SERVICE_DIMENSION, service)),
        )
    }

    /// Send `points` in backend-sized batches, all batches concurrently.
    ///
    /// Fails if any batch fails; nothing is retried here.
    pub async fn send_counts(&self, points: Vec<MetricPoint>) -> Result<(), SinkError> {
        if points.is_empty() {
            debug!("No metric points to send");
            return Ok(());
        }

        let summary = summarize(&points);
        let n_points = points.len();
        let batches = MetricBatch::partition(
            &self.settings.namespace,
            points,
            self.settings.max_batch_size,
        );

        debug!(
            points = n_points,
            batches = batches.len(),
            "Dispatching metric batches"
        );

        try_join_all(batches.iter().map(|batch| self.sink.put_batch(batch))).await?;

        info!(
            environment = %self.settings.environment,
            namespace = %self.settings.namespace,
            points = n_points,
            batches = batches.len(),
            "Sent metrics: {}",
            summary
        );

        Ok(())
    }
}

/// Human readable digest of a set of points, e.g.
/// `visits: 3, oldVisits: 0, openVisits: 1; /aws/lambda/x: 2`.
pub fn summarize(points: &[MetricPoint]) -> String {
    let value = |name: &str| {
        points
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.to_string())
    };

    let mut parts = Vec::new();
    if let (Some(today), Some(old), Some(open)) = (
        value(VISITS_TODAY_METRIC),
        value(OLD_VISITS_METRIC),
        value(OPEN_VISITS_METRIC),
    ) {
        parts.push(format!(
            "visits: {}, oldVisits: {}, openVisits: {}",
            today, old, open
        ));
    }

    parts.extend(
        points
            .iter()
            .filter(|p| p.name == TIMEOUTS_METRIC)
            .map(|p| {
                format!(
                    "{}: {}",
                    p.dimension(SERVICE_DIMENSION).unwrap_or("unknown"),
                    p.value
                )
            }),
    );

    parts.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use chrono::TimeZone;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap()
    }

    fn dispatcher(sink: Arc<RecordingSink>) -> MetricDispatcher {
        MetricDispatcher::new(sink, DispatchSettings::new("develop"), timestamp())
    }

    #[test]
    fn test_visit_points() {
        let d = dispatcher(Arc::new(RecordingSink::new()));
        let points = d.visit_points(&VisitCounts {
            visits_today: 42,
            stale_open_visits: 0,
            open_visits: 5,
        });

        let names: Vec<&str> = points.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["VisitsToday", "OldVisits", "OpenVisits"]);
        assert_eq!(points[0].value, 42.0);
        assert_eq!(points[2].value, 5.0);
        for p in &points {
            assert_eq!(p.dimensions, vec![Dimension::new("Environment", "develop")]);
            assert_eq!(p.timestamp, timestamp());
            assert_eq!(p.unit, Unit::Count);
        }
    }

    #[test]
    fn test_timeout_point_carries_service() {
        let d = dispatcher(Arc::new(RecordingSink::new()));
        let p = d.timeout_point("testGroup", 1);
        assert_eq!(p.name, "Timeouts");
        assert_eq!(p.dimension("Environment"), Some("develop"));
        assert_eq!(p.dimension("Service"), Some("testGroup"));
        assert_eq!(p.value, 1.0);
    }

    #[tokio::test]
    async fn test_send_counts_batches_points() {
        let sink = Arc::new(RecordingSink::new());
        let d = dispatcher(sink.clone());
        let points: Vec<_> = (0..41)
            .map(|i| d.timeout_point(&format!("group-{}", i), i))
            .collect();

        d.send_counts(points).await.unwrap();

        let mut sizes: Vec<usize> = sink.batches().iter().map(MetricBatch::len).collect();
        sizes.sort();
        assert_eq!(sizes, vec![1, 20, 20]);
        assert_eq!(sink.points().len(), 41);
        assert!(sink.batches().iter().all(|b| b.namespace == "CVS"));
    }

    #[tokio::test]
    async fn test_send_counts_empty_is_noop() {
        let sink = Arc::new(RecordingSink::new());
        dispatcher(sink.clone()).send_counts(Vec::new()).await.unwrap();
        assert_eq!(sink.calls(), 0);
    }

    #[tokio::test]
    async fn test_send_counts_fails_if_any_batch_fails() {
        let sink = Arc::new(RecordingSink::new());
        sink.push_failure(SinkError::Transport("down".into()));
        let d = dispatcher(sink.clone());
        let points: Vec<_> = (0..30).map(|i| d.timeout_point("g", i)).collect();

        let err = d.send_counts(points).await.unwrap_err();
        assert!(matches!(err, SinkError::Transport(_)));
    }

    #[test]
    fn test_summarize() {
        let d = dispatcher(Arc::new(RecordingSink::new()));
        let mut points = d.visit_points(&VisitCounts {
            visits_today: 3,
            stale_open_visits: 0,
            open_visits: 1,
        });
        points.push(d.timeout_point("/aws/lambda/x", 2));

        assert_eq!(
            summarize(&points),
            "visits: 3, oldVisits: 0, openVisits: 1; /aws/lambda/x: 2"
        );
        assert_eq!(summarize(&points[3..]), "/aws/lambda/x: 2");
    }
}

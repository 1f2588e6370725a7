use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Largest number of points the metrics backend accepts in one request.
pub const MAX_BATCH_SIZE: usize = 20;

pub const ENVIRONMENT_DIMENSION: &str = "Environment";
pub const SERVICE_DIMENSION: &str = "Service";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Unit {
    Count,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

impl Dimension {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single data point bound for the metrics backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricPoint {
    #[serde(rename = "MetricName")]
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub timestamp: DateTime<Utc>,
    pub value: f64,
    pub unit: Unit,
}

impl MetricPoint {
    /// Value of the named dimension, if present.
    pub fn dimension(&self, name: &str) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.name == name)
            .map(|d| d.value.as_str())
    }
}

/// Visit statistics computed once per invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitCounts {
    pub visits_today: u64,
    pub stale_open_visits: u64,
    pub open_visits: u64,
}

/// An ordered chunk of points sent to the backend in one request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricBatch {
    pub namespace: String,
    pub points: Vec<MetricPoint>,
}

impl MetricBatch {
    /// Split `points` into batches of at most `max_size` points, keeping order.
    ///
    /// `max_size` is clamped to `1..=MAX_BATCH_SIZE`.
    pub fn partition(namespace: &str, points: Vec<MetricPoint>, max_size: usize) -> Vec<Self> {
        let max_size = max_size.clamp(1, MAX_BATCH_SIZE);
        let mut batches = Vec::with_capacity(points.len().div_ceil(max_size));
        let mut current = Vec::with_capacity(max_size.min(points.len()));

        for point in points {
            current.push(point);
            if current.len() == max_size {
                batches.push(Self {
                    namespace: namespace.to_string(),
                    points: std::mem::take(&mut current),
                });
            }
        }

        if !current.is_empty() {
            batches.push(Self {
                namespace: namespace.to_string(),
                points: current,
            });
        }

        batches
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

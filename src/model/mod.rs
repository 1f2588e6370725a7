pub mod log;
pub mod metric;
pub mod record;

pub use log::{LogBatch, LogLine};
pub use metric::{Dimension, MetricBatch, MetricPoint, Unit, VisitCounts, MAX_BATCH_SIZE};
pub use record::{
    InputRecord, RecordOutcome, RecordStatus, TransformationEvent, TransformationResult,
};

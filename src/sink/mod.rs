pub mod dispatcher;
pub mod memory;
pub mod retry;
pub mod traits;

pub use dispatcher::{DispatchSettings, MetricDispatcher};
pub use memory::RecordingSink;
pub use retry::{RetryPolicy, RetryingSink};
pub use traits::{MetricsSink, SinkError};

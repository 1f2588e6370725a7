pub mod filter;
pub mod memory;
pub mod segmented;
pub mod traits;

pub use filter::{Condition, ExpressionValue, ScanFilter};
pub use memory::{ActivityRecord, MemoryStore};
pub use segmented::{default_segments, SegmentedCounter};
pub use traits::{ContinuationToken, CountingStore, ScanPage, ScanQuery, StoreError};

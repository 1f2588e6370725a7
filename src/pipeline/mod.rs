pub mod orchestrator;

use crate::decode::DecodeError;
use crate::pattern::PatternError;
use crate::sink::SinkError;
use crate::store::StoreError;
use thiserror::Error;

pub use orchestrator::{BatchOrchestrator, Collaborators};

/// Errors that can abort a batch-processing pass
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("pattern error: {0}")]
    Pattern(#[from] PatternError),
}

//! Metrics collection for streamed log batches.
//!
//! Decodes subscription payloads, counts task timeouts per log group, scans the
//! activities store for visit statistics once per invocation and ships the
//! resulting points to a metrics backend. The incoming records are always
//! acknowledged unchanged.

pub mod config;
pub mod decode;
pub mod logging;
pub mod model;
pub mod pattern;
pub mod pipeline;
pub mod sink;
pub mod store;
pub mod visits;

pub use config::{load_config, Config, ConfigError};
pub use pipeline::{BatchOrchestrator, PipelineError};

pub mod gzip;

use crate::model::LogBatch;
use async_trait::async_trait;
use thiserror::Error;

pub use gzip::GzipJsonDecoder;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid base64 payload: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("failed to decompress payload: {0}")]
    Decompress(#[from] std::io::Error),

    #[error("failed to parse log payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to compress payload: {0}")]
    Encode(#[source] std::io::Error),
}

/// Turns one raw record payload into a [`LogBatch`].
#[async_trait]
pub trait Decoder: Send + Sync {
    async fn decode(&self, raw: &[u8]) -> Result<LogBatch, DecodeError>;
}

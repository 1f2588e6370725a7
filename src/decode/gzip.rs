use super::{DecodeError, Decoder};
use crate::model::LogBatch;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{Read, Write};
use tracing::debug;

/// Decoder for base64 text wrapping a gzip-compressed JSON log subscription document.
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipJsonDecoder;

impl GzipJsonDecoder {
    pub fn new() -> Self {
        Self
    }

    /// Decode a payload synchronously.
    pub fn decode_payload(raw: &[u8]) -> Result<LogBatch, DecodeError> {
        let compressed = STANDARD.decode(raw.trim_ascii())?;

        let mut json = String::new();
        GzDecoder::new(compressed.as_slice()).read_to_string(&mut json)?;
        debug!(bytes = json.len(), payload = %json, "Decompressed log payload");

        Ok(serde_json::from_str(&json)?)
    }

    /// Produce the encoded form of `batch`, the inverse of [`decode_payload`](Self::decode_payload).
    pub fn encode_payload(batch: &LogBatch) -> Result<String, DecodeError> {
        let json = serde_json::to_vec(batch)?;
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(&json).map_err(DecodeError::Encode)?;
        let compressed = encoder.finish().map_err(DecodeError::Encode)?;
        Ok(STANDARD.encode(compressed))
    }
}

#[async_trait]
impl Decoder for GzipJsonDecoder {
    async fn decode(&self, raw: &[u8]) -> Result<LogBatch, DecodeError> {
        Self::decode_payload(raw)
    }
}

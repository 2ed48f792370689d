//! Payload encoding: JSON, then LZ4.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::types::error::{StoreError, StoreResult};

/// Encode a payload as JSON and compress it with LZ4 (size prepended).
pub fn compress_payload<P: Serialize>(payload: &P) -> StoreResult<Vec<u8>> {
    let json = serde_json::to_vec(payload).map_err(|e| StoreError::Payload(e.to_string()))?;
    Ok(lz4_flex::compress_prepend_size(&json))
}

/// Decompress and decode a payload written by [`compress_payload`].
pub fn decompress_payload<P: DeserializeOwned>(data: &[u8]) -> StoreResult<P> {
    let json = lz4_flex::decompress_size_prepended(data)
        .map_err(|e| StoreError::Compression(e.to_string()))?;
    serde_json::from_slice(&json).map_err(|e| StoreError::Payload(e.to_string()))
}

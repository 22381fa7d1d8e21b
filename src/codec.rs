//! Versioned byte encoding for values stored outside structured columns.
//!
//! Values are wrapped in a small JSON envelope carrying a format version, so
//! a blob written today can be recognised (and rejected) after the format
//! changes. Single values and lists are encoded the same way.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Version written by [`encode`] and accepted by [`decode`]
pub const CODEC_VERSION: u16 = 1;

/// Error type for encoding operations
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported encoding version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

#[derive(Serialize)]
struct EnvelopeRef<'a, T> {
    version: u16,
    payload: &'a T,
}

// Version already checked through `VersionOnly`
#[derive(Deserialize)]
struct Envelope<T> {
    payload: T,
}

#[derive(Deserialize)]
struct VersionOnly {
    version: u16,
}

/// Encode a value as a versioned envelope
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    let envelope = EnvelopeRef {
        version: CODEC_VERSION,
        payload: value,
    };
    Ok(serde_json::to_vec(&envelope)?)
}

/// Decode a blob written by [`encode`].
///
/// A missing blob decodes to `Ok(None)`.
pub fn decode<T: DeserializeOwned>(bytes: Option<&[u8]>) -> Result<Option<T>, CodecError> {
    let Some(bytes) = bytes else {
        return Ok(None);
    };

    // Check the version before the payload so a format change reports as such
    let VersionOnly { version } = serde_json::from_slice(bytes)?;
    if version != CODEC_VERSION {
        return Err(CodecError::UnsupportedVersion {
            found: version,
            expected: CODEC_VERSION,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(bytes)?;
    Ok(Some(envelope.payload))
}

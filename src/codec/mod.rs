//! Estimator blob codec
//!
//! Fitted models are stored in the `estimator` column as a self-describing,
//! versioned envelope instead of a language-specific object dump:
//!
//! ```text
//! offset  size  field
//! 0       4     magic  b"ARBE"
//! 4       1     format version (currently 1)
//! 5       1     compression tag (0 none, 1 lz4, 2 zstd)
//! 6       ..    payload: JSON of the serde value, compressed as tagged
//! ```
//!
//! # Example
//!
//! ```rust
//! use arbiter_db::codec::{self, Compression};
//!
//! let params = serde_json::json!({"n_estimators": 100, "max_depth": 8});
//! let blob = codec::encode(&params, Compression::None)?;
//!
//! assert_eq!(codec::inspect(&blob)?.version, codec::FORMAT_VERSION);
//! let decoded: serde_json::Value = codec::decode(&blob)?;
//! assert_eq!(decoded, params);
//! # Ok::<(), arbiter_db::Error>(())
//! ```

mod compression;

pub use compression::Compression;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::{Error, Result};

/// Leading bytes of every estimator blob.
pub const MAGIC: [u8; 4] = *b"ARBE";

/// Envelope version written by this build.
pub const FORMAT_VERSION: u8 = 1;

const HEADER_LEN: usize = MAGIC.len() + 2;

/// Decoded envelope header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlobHeader {
    /// Envelope format version
    pub version: u8,
    /// Payload compression
    pub compression: Compression,
    /// Size of the (possibly compressed) payload in bytes
    pub payload_len: usize,
}

/// Serialize a value into an estimator blob.
///
/// # Errors
///
/// Returns an error if the value cannot be serialized or the requested
/// compression is unavailable.
pub fn encode<T: Serialize + ?Sized>(value: &T, compression: Compression) -> Result<Vec<u8>> {
    let json = serde_json::to_vec(value)?;
    let payload = compression.compress(&json)?;

    let mut blob = Vec::with_capacity(HEADER_LEN + payload.len());
    blob.extend_from_slice(&MAGIC);
    blob.push(FORMAT_VERSION);
    blob.push(compression.tag());
    blob.extend_from_slice(&payload);
    Ok(blob)
}

/// Read the envelope header without decoding the payload.
///
/// # Errors
///
/// Returns [`Error::Codec`] if the blob is truncated, has the wrong magic,
/// an unsupported version, or an unknown compression tag.
pub fn inspect(blob: &[u8]) -> Result<BlobHeader> {
    if blob.len() < HEADER_LEN {
        return Err(Error::Codec(format!(
            "blob too short: {} bytes, header needs {HEADER_LEN}",
            blob.len()
        )));
    }
    if blob[..MAGIC.len()] != MAGIC {
        return Err(Error::Codec("bad magic: not an estimator blob".to_string()));
    }

    let version = blob[4];
    if version == 0 || version > FORMAT_VERSION {
        return Err(Error::Codec(format!(
            "unsupported format version {version} (this build reads up to {FORMAT_VERSION})"
        )));
    }

    Ok(BlobHeader {
        version,
        compression: Compression::from_tag(blob[5])?,
        payload_len: blob.len() - HEADER_LEN,
    })
}

/// Deserialize a value from an estimator blob.
///
/// # Errors
///
/// Returns an error if the header is invalid, the payload cannot be
/// decompressed, or the JSON does not match `T`.
pub fn decode<T: DeserializeOwned>(blob: &[u8]) -> Result<T> {
    let header = inspect(blob)?;
    let json = header.compression.decompress(&blob[HEADER_LEN..])?;
    serde_json::from_slice(&json).map_err(|e| Error::Codec(format!("malformed payload: {e}")))
}

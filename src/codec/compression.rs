//! Payload compression for estimator blobs
//!
//! LZ4 and ZSTD are available with the `compression` feature. Blobs written
//! by a build with the feature can still be inspected without it, but their
//! payload cannot be decoded.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Compression algorithm for blob payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Store the payload as-is (default)
    #[default]
    None,
    /// LZ4 - Fast compression, good for large fitted models
    Lz4,
    /// ZSTD - Better ratio, slower
    Zstd,
}

impl Compression {
    /// Get algorithm name as string
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lz4 => "lz4",
            Self::Zstd => "zstd",
        }
    }

    /// Tag byte written into the blob header.
    #[must_use]
    pub const fn tag(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Lz4 => 1,
            Self::Zstd => 2,
        }
    }

    /// Resolve a header tag byte.
    ///
    /// # Errors
    /// Returns [`Error::Codec`] for tags no version of the format defines.
    pub fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::None),
            1 => Ok(Self::Lz4),
            2 => Ok(Self::Zstd),
            other => Err(Error::Codec(format!("unknown compression tag {other}"))),
        }
    }

    /// Whether this build can compress and decompress with the algorithm.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        matches!(self, Self::None) || cfg!(feature = "compression")
    }

    /// Compress data using this algorithm
    ///
    /// # Errors
    /// Returns error if compression fails or the algorithm is not compiled in
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            #[cfg(feature = "compression")]
            Self::Lz4 => Ok(lz4_flex::compress_prepend_size(data)),
            #[cfg(feature = "compression")]
            Self::Zstd => zstd::encode_all(data, 3)
                .map_err(|e| Error::Codec(format!("ZSTD compression failed: {e}"))),
            #[cfg(not(feature = "compression"))]
            Self::Lz4 | Self::Zstd => Err(self.unavailable()),
        }
    }

    /// Decompress data using this algorithm
    ///
    /// # Errors
    /// Returns error if decompression fails (e.g., corrupted data) or the
    /// algorithm is not compiled in
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::None => Ok(data.to_vec()),
            #[cfg(feature = "compression")]
            Self::Lz4 => lz4_flex::decompress_size_prepended(data)
                .map_err(|e| Error::Codec(format!("LZ4 decompression failed: {e}"))),
            #[cfg(feature = "compression")]
            Self::Zstd => zstd::decode_all(data)
                .map_err(|e| Error::Codec(format!("ZSTD decompression failed: {e}"))),
            #[cfg(not(feature = "compression"))]
            Self::Lz4 | Self::Zstd => Err(self.unavailable()),
        }
    }

    #[cfg(not(feature = "compression"))]
    fn unavailable(&self) -> Error {
        Error::Codec(format!(
            "{} support not compiled in (enable the `compression` feature)",
            self.as_str()
        ))
    }
}

//! Store configuration
//!
//! Every field has a default, so an empty JSON object is a valid config:
//!
//! ```json
//! {
//!   "on_delete": "protect",
//!   "compression": "none",
//!   "data_dir": "/var/lib/arbiter"
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::codec::Compression;
use crate::{Error, Result};

/// What deleting an estimator does to the scores that reference it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OnDelete {
    /// Delete dependent scores along with the estimator (default).
    #[default]
    Cascade,
    /// Refuse to delete an estimator that still has scores.
    Protect,
}

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Delete policy for the `evaluations.estimator_id` foreign key
    pub on_delete: OnDelete,
    /// Compression used by [`Store::encode_estimator`](crate::Store::encode_estimator)
    pub compression: Compression,
    /// Directory holding the table files; required by `save`/`open`
    pub data_dir: Option<PathBuf>,
}

impl StoreConfig {
    /// Create a config builder.
    #[must_use]
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }

    /// Parse a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] on malformed JSON, unknown fields or
    /// invalid choice values.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| Error::Config(format!("invalid config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a JSON config file.
    ///
    /// # Errors
    ///
    /// Returns an IO error if the file cannot be read, or [`Error::Config`]
    /// if its contents are invalid.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&json)
    }

    /// Get the data directory, failing if none is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when `data_dir` is unset.
    pub fn require_data_dir(&self) -> Result<&Path> {
        self.data_dir
            .as_deref()
            .ok_or_else(|| Error::Config("data_dir is not set".to_string()))
    }

    fn validate(&self) -> Result<()> {
        if !self.compression.is_available() {
            return Err(Error::Config(format!(
                "compression {:?} is not available in this build (enable the `compression` feature)",
                self.compression.as_str()
            )));
        }
        Ok(())
    }
}

/// Builder for `StoreConfig`.
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the delete policy.
    #[must_use]
    pub const fn on_delete(mut self, on_delete: OnDelete) -> Self {
        self.config.on_delete = on_delete;
        self
    }

    /// Set the default blob compression.
    #[must_use]
    pub const fn compression(mut self, compression: Compression) -> Self {
        self.config.compression = compression;
        self
    }

    /// Set the data directory.
    #[must_use]
    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.config.data_dir = Some(data_dir.into());
        self
    }

    /// Build the config.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the selected compression is not compiled in.
    pub fn build(self) -> Result<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

//! Error types for arbiter-db
//!
//! Every write is validated before it touches a table, so these errors
//! surface at write time and leave the store unchanged.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// arbiter-db error types
#[derive(Error, Debug)]
pub enum Error {
    /// Value is not a member of a choice enumeration
    #[error("Invalid choice for {field}: {value:?} is not one of the allowed values")]
    InvalidChoice {
        /// Column holding the enumeration
        field: &'static str,
        /// Rejected value
        value: String,
    },

    /// String column exceeds its maximum length
    #[error("Field {field} is too long: {len} characters (max {max})")]
    FieldTooLong {
        /// Column name
        field: &'static str,
        /// Maximum length in characters
        max: usize,
        /// Actual length in characters
        len: usize,
    },

    /// Value does not fit the column type
    #[error("Field {field} is out of range: {value}")]
    OutOfRange {
        /// Column name
        field: &'static str,
        /// Rejected value, formatted
        value: String,
    },

    /// Primary key sequence cannot advance
    #[error("{entity} ids are exhausted: no id after {last}")]
    IdsExhausted {
        /// Table or record kind
        entity: &'static str,
        /// Largest id in use
        last: i64,
    },

    /// Foreign key points at a row that does not exist
    #[error("Missing reference: {field} = {id} does not exist")]
    MissingReference {
        /// Foreign key column
        field: &'static str,
        /// Dangling id
        id: i64,
    },

    /// Row lookup by primary key failed
    #[error("{entity} {id} not found")]
    NotFound {
        /// Table or record kind
        entity: &'static str,
        /// Requested id
        id: i64,
    },

    /// Delete blocked because dependent rows exist (`OnDelete::Protect`)
    #[error("Estimator {estimator} is protected: {scores} score(s) still reference it\nDelete the scores first or configure on_delete = \"cascade\"")]
    Protected {
        /// Estimator that was not deleted
        estimator: i64,
        /// Number of dependent scores
        scores: usize,
    },

    /// Estimator blob could not be encoded or decoded
    #[error("Codec error: {0}")]
    Codec(String),

    /// Invalid store configuration
    #[error("Config error: {0}")]
    Config(String),

    /// Storage error (Parquet/Arrow table files)
    #[error("Storage error: {0}")]
    StorageError(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

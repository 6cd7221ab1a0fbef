//! # arbiter-db: Estimator & Score Persistence
//!
//! Embedded storage for the two records of the arbiter experiment tracker:
//! trained **estimators** and the evaluation **scores** computed for them.
//!
//! ## Design Principles
//!
//! - **Typed choices**: model types and metrics are enums, so an unknown
//!   value is rejected at the boundary instead of being stored
//! - **Explicit references**: foreign keys are plain ids resolved through the
//!   [`Store`], never hidden object graphs
//! - **Versioned blobs**: fitted models are stored in a self-describing
//!   envelope ([`codec`]) rather than a language-specific object dump
//! - **Columnar persistence**: tables are saved as Parquet files with a fixed
//!   Arrow schema ([`storage`])
//!
//! ## Example Usage
//!
//! ```rust
//! use arbiter_db::{Estimator, Metric, ModelType, Score, Store, StoreConfig, OnDelete};
//!
//! let config = StoreConfig::builder().on_delete(OnDelete::Cascade).build()?;
//! let mut store = Store::with_config(config);
//!
//! let kmeans = store.create_estimator(
//!     Estimator::builder(ModelType::Clusters)
//!         .model_class("KMeans")
//!         .model_form("KMeans(n_clusters=8)")
//!         .build(),
//! )?;
//! store.create_score(
//!     Score::builder(kmeans.id(), Metric::Silhouette)
//!         .score(0.42)
//!         .folds(vec![0.40, 0.43, 0.43])
//!         .build(),
//! )?;
//!
//! // Deleting the estimator cascades to its scores
//! assert_eq!(store.delete_estimator(kmeans.id())?, 1);
//! assert!(store.is_empty());
//! # Ok::<(), arbiter_db::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod codec;
pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod text;

pub use codec::Compression;
pub use config::{OnDelete, StoreConfig, StoreConfigBuilder};
pub use error::{Error, Result};
pub use model::{
    CorpusId, Estimator, EstimatorBuilder, EstimatorDisplay, EstimatorId, Metric, ModelType,
    NewEstimator, NewScore, Score, ScoreBuilder, ScoreDisplay, ScoreId, UserId,
};
pub use store::Store;

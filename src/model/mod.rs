//! Estimator & Score schema
//!
//! The records stored by arbiter: trained estimators and the evaluation
//! scores computed for them.
//!
//! ## Schema Overview
//!
//! ```text
//! UserId / CorpusId (external, nullable FK)
//!        │
//!        ▼
//! Estimator (1) ──< Score (N)
//! [estimators]      [evaluations]
//! ```
//!
//! Records are built as drafts ([`NewEstimator`], [`NewScore`]) and become
//! rows once a [`Store`](crate::Store) assigns their id and timestamps.
//!
//! ## Usage
//!
//! ```rust
//! use arbiter_db::{Metric, ModelType, Score, Estimator, Store};
//!
//! let mut store = Store::new();
//!
//! let estimator = store.create_estimator(
//!     Estimator::builder(ModelType::Classifier)
//!         .model_class("LogisticRegression")
//!         .build(),
//! )?;
//!
//! store.create_score(Score::builder(estimator.id(), Metric::Accuracy).score(0.91).build())?;
//! assert_eq!(store.scores_for(estimator.id()).len(), 1);
//! # Ok::<(), arbiter_db::Error>(())
//! ```

mod estimator;
mod ids;
mod metric;
mod model_type;
mod score;

pub use estimator::{
    Estimator, EstimatorBuilder, EstimatorDisplay, NewEstimator, MODEL_CLASS_MAX_LEN,
    MODEL_FORM_MAX_LEN,
};
pub use ids::{CorpusId, EstimatorId, ScoreId, UserId};
pub use metric::Metric;
pub use model_type::ModelType;
pub use score::{NewScore, Score, ScoreBuilder, ScoreDisplay, LABEL_MAX_LEN};

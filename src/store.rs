//! Store - embedded tables for estimators and their scores
//!
//! The store plays the part of the relational database behind the schema:
//! it allocates ids, stamps `created`/`modified`, enforces the foreign keys
//! and applies the delete policy from [`StoreConfig`].

use chrono::Utc;
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{OnDelete, StoreConfig};
use crate::model::{
    CorpusId, Estimator, EstimatorId, Metric, NewEstimator, NewScore, Score, ScoreId, UserId,
};
use crate::storage::{self, ESTIMATORS_FILE, EVALUATIONS_FILE};
use crate::{codec, Error, Result};

/// In-memory tables for estimators and scores, persisted as Parquet files.
///
/// ## Directory
///
/// Users and corpora live in other systems. The store only keeps a
/// directory of the ids it may reference (and their display names), filled
/// with [`register_user`](Self::register_user) and
/// [`register_corpus`](Self::register_corpus). Writes that point an
/// estimator at an unregistered id fail with [`Error::MissingReference`].
///
/// ## Example
///
/// ```rust
/// use arbiter_db::{Estimator, Metric, ModelType, Score, Store, UserId};
/// use chrono::{TimeZone, Utc};
///
/// let mut store = Store::new();
/// store.register_user(UserId::new(1), "bbengfort");
///
/// let forest = store.create_estimator(
///     Estimator::builder(ModelType::Classifier)
///         .model_class("RandomForestClassifier")
///         .owner(UserId::new(1))
///         .created_at(Utc.with_ymd_and_hms(2016, 8, 2, 9, 16, 7).unwrap())
///         .build(),
/// )?;
/// let f1 = store.create_score(Score::builder(forest.id(), Metric::F1).score(0.8126).build())?;
///
/// assert_eq!(
///     store.render_score(f1.id())?,
///     "F1 score for RandomForestClassifier Classifier (2016-08-02) for bbengfort = 0.813"
/// );
/// # Ok::<(), arbiter_db::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Store {
    config: StoreConfig,
    estimators: FxHashMap<EstimatorId, Estimator>,
    scores: FxHashMap<ScoreId, Score>,
    users: FxHashMap<UserId, String>,
    corpora: FxHashMap<CorpusId, String>,
    last_estimator_id: i64,
    last_score_id: i64,
}

impl Store {
    /// Create an empty store with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Get the store configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Check if the store has no estimators and no scores.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty() && self.scores.is_empty()
    }

    // ------------------------------------------------------------------
    // Directory of external collaborators
    // ------------------------------------------------------------------

    /// Register a user that estimators may reference as their owner.
    ///
    /// Registering an existing id replaces its display name.
    pub fn register_user(&mut self, id: UserId, username: impl Into<String>) {
        self.users.insert(id, username.into());
    }

    /// Get a registered user's display name.
    #[must_use]
    pub fn username(&self, id: UserId) -> Option<&str> {
        self.users.get(&id).map(String::as_str)
    }

    /// Register a corpus that estimators may reference.
    pub fn register_corpus(&mut self, id: CorpusId, name: impl Into<String>) {
        self.corpora.insert(id, name.into());
    }

    /// Get a registered corpus' name.
    #[must_use]
    pub fn corpus_name(&self, id: CorpusId) -> Option<&str> {
        self.corpora.get(&id).map(String::as_str)
    }

    fn check_owner(&self, owner: Option<UserId>) -> Result<()> {
        match owner {
            Some(id) if !self.users.contains_key(&id) => Err(Error::MissingReference {
                field: "owner_id",
                id: id.get(),
            }),
            _ => Ok(()),
        }
    }

    fn check_corpus(&self, corpus: Option<CorpusId>) -> Result<()> {
        match corpus {
            Some(id) if !self.corpora.contains_key(&id) => Err(Error::MissingReference {
                field: "corpus_id",
                id: id.get(),
            }),
            _ => Ok(()),
        }
    }

    // ------------------------------------------------------------------
    // Estimators
    // ------------------------------------------------------------------

    /// Encode a fitted model with the configured blob compression.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the value cannot be serialized.
    pub fn encode_estimator<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>> {
        codec::encode(value, self.config.compression)
    }

    /// Store a new estimator, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::FieldTooLong`] or [`Error::OutOfRange`] if a column
    /// limit is exceeded, [`Error::MissingReference`] if the owner or corpus
    /// is not registered, or [`Error::IdsExhausted`] once the id sequence
    /// reaches `i64::MAX`. Nothing is stored on error.
    pub fn create_estimator(&mut self, draft: NewEstimator) -> Result<Estimator> {
        self.check_owner(draft.owner)?;
        self.check_corpus(draft.corpus)?;

        let id = EstimatorId::new(next_id("estimator", self.last_estimator_id)?);
        let estimator = Estimator::from_draft(id, draft, Utc::now());
        estimator.validate()?;

        self.last_estimator_id = id.get();
        self.estimators.insert(id, estimator.clone());

        debug!(
            estimator = %id,
            model_type = %estimator.model_type(),
            model_class = estimator.model_class().unwrap_or_default(),
            "created estimator"
        );
        Ok(estimator)
    }

    /// Get an estimator by id.
    #[must_use]
    pub fn get_estimator(&self, id: EstimatorId) -> Option<&Estimator> {
        self.estimators.get(&id)
    }

    /// Get all estimators, ordered by id.
    #[must_use]
    pub fn estimators(&self) -> Vec<&Estimator> {
        let mut rows: Vec<&Estimator> = self.estimators.values().collect();
        rows.sort_by_key(|e| e.id());
        rows
    }

    /// Get the number of estimators.
    #[must_use]
    pub fn estimator_count(&self) -> usize {
        self.estimators.len()
    }

    /// Get the most recently created estimator.
    ///
    /// Ties on `created` go to the higher id.
    #[must_use]
    pub fn latest_estimator(&self) -> Option<&Estimator> {
        self.estimators
            .values()
            .max_by_key(|e| (e.created(), e.id()))
    }

    /// Apply an administrative edit to an estimator.
    ///
    /// The edit runs on a copy; the row is replaced only if the result
    /// passes validation, and `modified` is bumped. Foreign keys are checked
    /// only when the edit changes them.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or the validation
    /// error of the edited row.
    pub fn update_estimator<F>(&mut self, id: EstimatorId, edit: F) -> Result<Estimator>
    where
        F: FnOnce(&mut Estimator),
    {
        let current = self.estimators.get(&id).ok_or(Error::NotFound {
            entity: "estimator",
            id: id.get(),
        })?;

        let mut edited = current.clone();
        edit(&mut edited);
        edited.validate()?;

        if edited.owner() != current.owner() {
            self.check_owner(edited.owner())?;
        }
        if edited.corpus() != current.corpus() {
            self.check_corpus(edited.corpus())?;
        }

        edited.touch(Utc::now());
        self.estimators.insert(id, edited.clone());

        debug!(estimator = %id, "updated estimator");
        Ok(edited)
    }

    /// Delete an estimator, applying the configured [`OnDelete`] policy.
    ///
    /// Returns the number of scores deleted along with it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or [`Error::Protected`]
    /// when the policy is `Protect` and scores still reference the estimator.
    pub fn delete_estimator(&mut self, id: EstimatorId) -> Result<usize> {
        if !self.estimators.contains_key(&id) {
            return Err(Error::NotFound {
                entity: "estimator",
                id: id.get(),
            });
        }

        let dependents = self.scores.values().filter(|s| s.estimator() == id).count();

        if self.config.on_delete == OnDelete::Protect && dependents > 0 {
            warn!(estimator = %id, scores = dependents, "delete blocked by dependent scores");
            return Err(Error::Protected {
                estimator: id.get(),
                scores: dependents,
            });
        }

        self.scores.retain(|_, s| s.estimator() != id);
        self.estimators.remove(&id);

        debug!(estimator = %id, cascaded = dependents, "deleted estimator");
        Ok(dependents)
    }

    // ------------------------------------------------------------------
    // Scores
    // ------------------------------------------------------------------

    /// Store a new score, assigning its id and timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingReference`] if the estimator does not exist,
    /// [`Error::FieldTooLong`] if the label exceeds its limit, or
    /// [`Error::IdsExhausted`] once the id sequence reaches `i64::MAX`.
    pub fn create_score(&mut self, draft: NewScore) -> Result<Score> {
        if !self.estimators.contains_key(&draft.estimator) {
            return Err(Error::MissingReference {
                field: "estimator_id",
                id: draft.estimator.get(),
            });
        }

        let id = ScoreId::new(next_id("score", self.last_score_id)?);
        let score = Score::from_draft(id, draft, Utc::now());
        score.validate()?;

        self.last_score_id = id.get();
        self.scores.insert(id, score.clone());

        debug!(
            score = %id,
            estimator = %score.estimator(),
            metric = %score.metric(),
            "created score"
        );
        Ok(score)
    }

    /// Get a score by id.
    #[must_use]
    pub fn get_score(&self, id: ScoreId) -> Option<&Score> {
        self.scores.get(&id)
    }

    /// Get all scores, ordered by id.
    #[must_use]
    pub fn scores(&self) -> Vec<&Score> {
        let mut rows: Vec<&Score> = self.scores.values().collect();
        rows.sort_by_key(|s| s.id());
        rows
    }

    /// Get the number of scores.
    #[must_use]
    pub fn score_count(&self) -> usize {
        self.scores.len()
    }

    /// Get every score of an estimator, ordered by id.
    #[must_use]
    pub fn scores_for(&self, estimator: EstimatorId) -> Vec<&Score> {
        let mut rows: Vec<&Score> = self
            .scores
            .values()
            .filter(|s| s.estimator() == estimator)
            .collect();
        rows.sort_by_key(|s| s.id());
        rows
    }

    /// Get the most recently created score.
    #[must_use]
    pub fn latest_score(&self) -> Option<&Score> {
        self.scores.values().max_by_key(|s| (s.created(), s.id()))
    }

    /// Find the latest score of an estimator for a metric and label.
    ///
    /// `label: None` matches only unlabeled scores.
    #[must_use]
    pub fn find_score(
        &self,
        estimator: EstimatorId,
        metric: Metric,
        label: Option<&str>,
    ) -> Option<&Score> {
        self.scores
            .values()
            .filter(|s| s.estimator() == estimator && s.metric() == metric && s.label() == label)
            .max_by_key(|s| (s.created(), s.id()))
    }

    /// Delete a score.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id.
    pub fn delete_score(&mut self, id: ScoreId) -> Result<Score> {
        let score = self.scores.remove(&id).ok_or(Error::NotFound {
            entity: "score",
            id: id.get(),
        })?;
        debug!(score = %id, "deleted score");
        Ok(score)
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    fn owner_name(&self, estimator: &Estimator) -> Result<Option<&str>> {
        estimator
            .owner()
            .map(|id| {
                self.username(id).ok_or(Error::MissingReference {
                    field: "owner_id",
                    id: id.get(),
                })
            })
            .transpose()
    }

    /// Render an estimator, resolving its owner through the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or
    /// [`Error::MissingReference`] if the owner is not registered.
    pub fn render_estimator(&self, id: EstimatorId) -> Result<String> {
        let estimator = self.get_estimator(id).ok_or(Error::NotFound {
            entity: "estimator",
            id: id.get(),
        })?;
        let owner = self.owner_name(estimator)?;
        Ok(estimator.display(owner).to_string())
    }

    /// Render a score together with its estimator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or
    /// [`Error::MissingReference`] if the estimator's owner is not registered.
    pub fn render_score(&self, id: ScoreId) -> Result<String> {
        let score = self.get_score(id).ok_or(Error::NotFound {
            entity: "score",
            id: id.get(),
        })?;
        let estimator = self
            .get_estimator(score.estimator())
            .ok_or(Error::MissingReference {
                field: "estimator_id",
                id: score.estimator().get(),
            })?;
        let owner = self.owner_name(estimator)?;
        Ok(score.display(estimator.display(owner)).to_string())
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    /// Write both tables to the configured data directory.
    ///
    /// The directory is created if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no data directory is configured, or a
    /// storage/IO error if a table cannot be written.
    pub fn save(&self) -> Result<()> {
        let dir = self.config.require_data_dir()?;
        std::fs::create_dir_all(dir)?;

        let estimators = self.estimators();
        storage::write_table(
            &dir.join(ESTIMATORS_FILE),
            &storage::estimators_to_batch(&estimators)?,
        )?;

        let scores = self.scores();
        storage::write_table(
            &dir.join(EVALUATIONS_FILE),
            &storage::scores_to_batch(&scores)?,
        )?;

        info!(
            dir = %dir.display(),
            estimators = estimators.len(),
            scores = scores.len(),
            "saved store"
        );
        Ok(())
    }

    /// Load a store from the configured data directory.
    ///
    /// Missing table files are treated as empty tables. The user and corpus
    /// directory is not persisted and starts empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if no data directory is configured, or
    /// [`Error::StorageError`] if a table is unreadable, holds duplicate ids,
    /// or a score references a missing estimator.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let dir = config.require_data_dir()?.to_path_buf();
        let mut store = Self::with_config(config);

        for batch in storage::read_table(&dir.join(ESTIMATORS_FILE))? {
            for row in storage::estimators_from_batch(&batch)? {
                let id = row.id();
                if store.estimators.insert(id, row).is_some() {
                    return Err(Error::StorageError(format!(
                        "duplicate estimator id {id} in {ESTIMATORS_FILE}"
                    )));
                }
                store.last_estimator_id = store.last_estimator_id.max(id.get());
            }
        }

        for batch in storage::read_table(&dir.join(EVALUATIONS_FILE))? {
            for row in storage::scores_from_batch(&batch)? {
                let id = row.id();
                if !store.estimators.contains_key(&row.estimator()) {
                    return Err(Error::StorageError(format!(
                        "score {id} references missing estimator {}",
                        row.estimator()
                    )));
                }
                if store.scores.insert(id, row).is_some() {
                    return Err(Error::StorageError(format!(
                        "duplicate score id {id} in {EVALUATIONS_FILE}"
                    )));
                }
                store.last_score_id = store.last_score_id.max(id.get());
            }
        }

        info!(
            dir = %dir.display(),
            estimators = store.estimators.len(),
            scores = store.scores.len(),
            "opened store"
        );
        Ok(store)
    }
}

fn next_id(entity: &'static str, last: i64) -> Result<i64> {
    last.checked_add(1).ok_or(Error::IdsExhausted { entity, last })
}

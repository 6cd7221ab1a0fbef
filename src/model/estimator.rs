//! Estimator - a trained model artifact and how it was built

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use super::{CorpusId, EstimatorId, ModelType, UserId};
use crate::codec::{self, Compression};
use crate::text::{check_len, title_case};
use crate::{Error, Result};

/// Maximum length of `model_class`, in characters.
pub const MODEL_CLASS_MAX_LEN: usize = 255;

/// Maximum length of `model_form`, in characters.
pub const MODEL_FORM_MAX_LEN: usize = 512;

/// Estimator represents one trained statistical model.
///
/// Rows are created by [`Store::create_estimator`](crate::Store::create_estimator)
/// from a [`NewEstimator`] draft, which assigns the id and timestamps.
/// Afterwards a row only changes through administrative edits.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Estimator {
    id: EstimatorId,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    model_type: ModelType,
    model_class: Option<String>,
    model_form: Option<String>,
    estimator: Option<Vec<u8>>,
    build_time: Option<Duration>,
    owner: Option<UserId>,
    corpus: Option<CorpusId>,
}

impl Estimator {
    /// Create a builder for a new estimator draft.
    #[must_use]
    pub fn builder(model_type: ModelType) -> EstimatorBuilder {
        EstimatorBuilder::new(model_type)
    }

    pub(crate) fn from_draft(
        id: EstimatorId,
        draft: NewEstimator,
        now: DateTime<Utc>,
    ) -> Self {
        let created = draft.created.unwrap_or(now).trunc_subsecs(6);
        let mut estimator = Self {
            id,
            created,
            modified: created,
            model_type: draft.model_type,
            model_class: draft.model_class,
            model_form: draft.model_form,
            estimator: draft.estimator,
            build_time: draft.build_time,
            owner: draft.owner,
            corpus: draft.corpus,
        };
        estimator.normalize();
        estimator
    }

    /// Reassemble a persisted row.
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn from_row(
        id: EstimatorId,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        model_type: ModelType,
        model_class: Option<String>,
        model_form: Option<String>,
        estimator: Option<Vec<u8>>,
        build_time: Option<Duration>,
        owner: Option<UserId>,
        corpus: Option<CorpusId>,
    ) -> Self {
        Self {
            id,
            created,
            modified,
            model_type,
            model_class,
            model_form,
            estimator,
            build_time,
            owner,
            corpus,
        }
    }

    /// Get the primary key.
    #[must_use]
    pub const fn id(&self) -> EstimatorId {
        self.id
    }

    /// Get the creation timestamp.
    #[must_use]
    pub const fn created(&self) -> DateTime<Utc> {
        self.created
    }

    /// Get the last-modified timestamp.
    #[must_use]
    pub const fn modified(&self) -> DateTime<Utc> {
        self.modified
    }

    /// Get the model type.
    #[must_use]
    pub const fn model_type(&self) -> ModelType {
        self.model_type
    }

    /// Get the implementation class name, if recorded.
    #[must_use]
    pub fn model_class(&self) -> Option<&str> {
        self.model_class.as_deref()
    }

    /// Get the textual representation of the model configuration, if recorded.
    #[must_use]
    pub fn model_form(&self) -> Option<&str> {
        self.model_form.as_deref()
    }

    /// Get the raw estimator blob, if stored.
    #[must_use]
    pub fn estimator(&self) -> Option<&[u8]> {
        self.estimator.as_deref()
    }

    /// Decode the estimator blob into `T`.
    ///
    /// Returns `Ok(None)` when no blob is stored.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the blob is invalid or does not match `T`.
    pub fn load_estimator<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>> {
        self.estimator.as_deref().map(codec::decode).transpose()
    }

    /// Get the training time, if recorded.
    #[must_use]
    pub const fn build_time(&self) -> Option<Duration> {
        self.build_time
    }

    /// Get the owning user, if any.
    #[must_use]
    pub const fn owner(&self) -> Option<UserId> {
        self.owner
    }

    /// Get the training corpus, if any.
    #[must_use]
    pub const fn corpus(&self) -> Option<CorpusId> {
        self.corpus
    }

    /// Set the model type.
    pub fn set_model_type(&mut self, model_type: ModelType) {
        self.model_type = model_type;
    }

    /// Set or clear the implementation class name.
    pub fn set_model_class(&mut self, model_class: Option<String>) {
        self.model_class = model_class;
    }

    /// Set or clear the model configuration text.
    pub fn set_model_form(&mut self, model_form: Option<String>) {
        self.model_form = model_form;
    }

    /// Set or clear the estimator blob.
    pub fn set_estimator(&mut self, estimator: Option<Vec<u8>>) {
        self.estimator = estimator;
    }

    /// Set or clear the training time.
    pub fn set_build_time(&mut self, build_time: Option<Duration>) {
        self.build_time = build_time;
    }

    /// Set or clear the owner.
    pub fn set_owner(&mut self, owner: Option<UserId>) {
        self.owner = owner;
    }

    /// Set or clear the training corpus.
    pub fn set_corpus(&mut self, corpus: Option<CorpusId>) {
        self.corpus = corpus;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.modified = now.trunc_subsecs(6);
        self.normalize();
    }

    /// Columns hold microseconds; drop anything finer.
    fn normalize(&mut self) {
        self.build_time = self
            .build_time
            .map(|d| Duration::new(d.as_secs(), d.subsec_micros() * 1_000));
    }

    /// Check column limits: string lengths, and `build_time` must fit the
    /// signed microsecond column.
    pub(crate) fn validate(&self) -> Result<()> {
        check_len("model_class", self.model_class.as_deref(), MODEL_CLASS_MAX_LEN)?;
        check_len("model_form", self.model_form.as_deref(), MODEL_FORM_MAX_LEN)?;

        if let Some(build_time) = self.build_time {
            if i64::try_from(build_time.as_micros()).is_err() {
                return Err(Error::OutOfRange {
                    field: "build_time",
                    value: format!("{build_time:?}"),
                });
            }
        }
        Ok(())
    }

    /// Render the estimator for humans.
    ///
    /// The owner is a foreign key, so its display name is resolved by the
    /// caller (see [`Store::render_estimator`](crate::Store::render_estimator)).
    ///
    /// ```rust
    /// use arbiter_db::{Estimator, EstimatorId, ModelType};
    /// use chrono::{TimeZone, Utc};
    ///
    /// let estimator = Estimator::builder(ModelType::Classifier)
    ///     .model_class("RandomForestClassifier")
    ///     .created_at(Utc.with_ymd_and_hms(2016, 8, 2, 9, 16, 7).unwrap())
    ///     .build()
    ///     .into_estimator(EstimatorId::new(1));
    ///
    /// assert_eq!(
    ///     estimator.display(Some("bbengfort")).to_string(),
    ///     "RandomForestClassifier Classifier (2016-08-02) for bbengfort"
    /// );
    /// ```
    #[must_use]
    pub const fn display<'a>(&'a self, owner: Option<&'a str>) -> EstimatorDisplay<'a> {
        EstimatorDisplay {
            estimator: self,
            owner,
        }
    }
}

/// Human-readable rendering of an [`Estimator`].
#[derive(Debug, Clone, Copy)]
pub struct EstimatorDisplay<'a> {
    estimator: &'a Estimator,
    owner: Option<&'a str>,
}

impl fmt::Display for EstimatorDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({})",
            self.estimator.model_class().unwrap_or("None"),
            title_case(self.estimator.model_type.as_str()),
            self.estimator.created.format("%Y-%m-%d")
        )?;

        if let Some(owner) = self.owner {
            write!(f, " for {owner}")?;
        }

        Ok(())
    }
}

/// Draft of an estimator row that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewEstimator {
    pub(crate) model_type: ModelType,
    pub(crate) model_class: Option<String>,
    pub(crate) model_form: Option<String>,
    pub(crate) estimator: Option<Vec<u8>>,
    pub(crate) build_time: Option<Duration>,
    pub(crate) owner: Option<UserId>,
    pub(crate) corpus: Option<CorpusId>,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl NewEstimator {
    /// Turn the draft into a detached row with the given id, without a store.
    ///
    /// Timestamps default to now. Useful for rendering and tests; rows that
    /// should persist go through [`Store::create_estimator`](crate::Store::create_estimator).
    #[must_use]
    pub fn into_estimator(self, id: EstimatorId) -> Estimator {
        Estimator::from_draft(id, self, Utc::now())
    }
}

/// Builder for `NewEstimator`.
#[derive(Debug)]
pub struct EstimatorBuilder {
    draft: NewEstimator,
}

impl EstimatorBuilder {
    /// Create a new builder with the required model type.
    #[must_use]
    pub const fn new(model_type: ModelType) -> Self {
        Self {
            draft: NewEstimator {
                model_type,
                model_class: None,
                model_form: None,
                estimator: None,
                build_time: None,
                owner: None,
                corpus: None,
                created: None,
            },
        }
    }

    /// Set the implementation class name (e.g. `RandomForestClassifier`).
    #[must_use]
    pub fn model_class(mut self, model_class: impl Into<String>) -> Self {
        self.draft.model_class = Some(model_class.into());
        self
    }

    /// Set the textual representation of the model configuration.
    #[must_use]
    pub fn model_form(mut self, model_form: impl Into<String>) -> Self {
        self.draft.model_form = Some(model_form.into());
        self
    }

    /// Set a pre-encoded estimator blob.
    #[must_use]
    pub fn estimator(mut self, blob: Vec<u8>) -> Self {
        self.draft.estimator = Some(blob);
        self
    }

    /// Encode a fitted model into the estimator blob.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the value cannot be serialized or the
    /// compression is unavailable.
    pub fn estimator_object<T: Serialize + ?Sized>(
        mut self,
        value: &T,
        compression: Compression,
    ) -> Result<Self> {
        self.draft.estimator = Some(codec::encode(value, compression)?);
        Ok(self)
    }

    /// Set the training time.
    #[must_use]
    pub const fn build_time(mut self, build_time: Duration) -> Self {
        self.draft.build_time = Some(build_time);
        self
    }

    /// Set the owning user.
    #[must_use]
    pub const fn owner(mut self, owner: UserId) -> Self {
        self.draft.owner = Some(owner);
        self
    }

    /// Set the training corpus.
    #[must_use]
    pub const fn corpus(mut self, corpus: CorpusId) -> Self {
        self.draft.corpus = Some(corpus);
        self
    }

    /// Set a custom creation timestamp (useful for imports/testing).
    #[must_use]
    pub const fn created_at(mut self, created: DateTime<Utc>) -> Self {
        self.draft.created = Some(created);
        self
    }

    /// Build the `NewEstimator` draft.
    #[must_use]
    pub fn build(self) -> NewEstimator {
        self.draft
    }
}

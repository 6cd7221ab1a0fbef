//! Score - one evaluation metric value for an estimator

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{EstimatorDisplay, EstimatorId, Metric, ScoreId};
use crate::text::{check_len, title_case};
use crate::Result;

/// Maximum length of `label`, in characters.
pub const LABEL_MAX_LEN: usize = 32;

/// Score stores one evaluation result for an estimator.
///
/// A score is keyed by its estimator, metric and optional label (e.g. a
/// per-class precision). `folds` keeps the per-fold values when the score
/// came out of cross-validation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Score {
    id: ScoreId,
    created: DateTime<Utc>,
    modified: DateTime<Utc>,
    metric: Metric,
    score: Option<f64>,
    label: Option<String>,
    folds: Option<Vec<f64>>,
    estimator: EstimatorId,
}

impl Score {
    /// Create a builder for a score of `metric` on `estimator`.
    #[must_use]
    pub const fn builder(estimator: EstimatorId, metric: Metric) -> ScoreBuilder {
        ScoreBuilder::new(estimator, metric)
    }

    pub(crate) fn from_draft(id: ScoreId, draft: NewScore, now: DateTime<Utc>) -> Self {
        let created = draft.created.unwrap_or(now).trunc_subsecs(6);
        Self {
            id,
            created,
            modified: created,
            metric: draft.metric,
            score: draft.score,
            label: draft.label,
            folds: draft.folds,
            estimator: draft.estimator,
        }
    }

    /// Reassemble a persisted row.
    #[allow(clippy::too_many_arguments)]
    pub(crate) const fn from_row(
        id: ScoreId,
        created: DateTime<Utc>,
        modified: DateTime<Utc>,
        metric: Metric,
        score: Option<f64>,
        label: Option<String>,
        folds: Option<Vec<f64>>,
        estimator: EstimatorId,
    ) -> Self {
        Self {
            id,
            created,
            modified,
            metric,
            score,
            label,
            folds,
            estimator,
        }
    }

    /// Get the primary key.
    #[must_use]
    pub const fn id(&self) -> ScoreId {
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

    /// Get the metric.
    #[must_use]
    pub const fn metric(&self) -> Metric {
        self.metric
    }

    /// Get the metric value, if recorded.
    #[must_use]
    pub const fn score(&self) -> Option<f64> {
        self.score
    }

    /// Get the sub-label, if any.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Get the cross-validation fold values, in fold order.
    #[must_use]
    pub fn folds(&self) -> Option<&[f64]> {
        self.folds.as_deref()
    }

    /// Mean of the fold values, when there is at least one fold.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn fold_mean(&self) -> Option<f64> {
        let folds = self.folds.as_deref().filter(|f| !f.is_empty())?;
        Some(folds.iter().sum::<f64>() / folds.len() as f64)
    }

    /// Get the evaluated estimator.
    #[must_use]
    pub const fn estimator(&self) -> EstimatorId {
        self.estimator
    }

    pub(crate) fn validate(&self) -> Result<()> {
        check_len("label", self.label.as_deref(), LABEL_MAX_LEN)
    }

    /// Render the score for humans, given the rendering of its estimator.
    #[must_use]
    pub const fn display<'a>(&'a self, estimator: EstimatorDisplay<'a>) -> ScoreDisplay<'a> {
        ScoreDisplay {
            score: self,
            estimator,
        }
    }
}

/// Human-readable rendering of a [`Score`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreDisplay<'a> {
    score: &'a Score,
    estimator: EstimatorDisplay<'a>,
}

impl fmt::Display for ScoreDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(label) = self.score.label().filter(|l| !l.is_empty()) {
            write!(f, "{} ", title_case(label))?;
        }

        write!(
            f,
            "{} score for {} = ",
            self.score.metric.title(),
            self.estimator
        )?;

        match self.score.score {
            Some(value) if value.is_nan() => f.write_str("nan"),
            Some(value) => write!(f, "{value:.3}"),
            None => f.write_str("n/a"),
        }
    }
}

/// Draft of a score row that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewScore {
    pub(crate) estimator: EstimatorId,
    pub(crate) metric: Metric,
    pub(crate) score: Option<f64>,
    pub(crate) label: Option<String>,
    pub(crate) folds: Option<Vec<f64>>,
    pub(crate) created: Option<DateTime<Utc>>,
}

impl NewScore {
    /// Turn the draft into a detached row with the given id, without a store.
    #[must_use]
    pub fn into_score(self, id: ScoreId) -> Score {
        Score::from_draft(id, self, Utc::now())
    }
}

/// Builder for `NewScore`.
#[derive(Debug)]
pub struct ScoreBuilder {
    draft: NewScore,
}

impl ScoreBuilder {
    /// Create a new builder with required fields.
    #[must_use]
    pub const fn new(estimator: EstimatorId, metric: Metric) -> Self {
        Self {
            draft: NewScore {
                estimator,
                metric,
                score: None,
                label: None,
                folds: None,
                created: None,
            },
        }
    }

    /// Set the metric value.
    #[must_use]
    pub const fn score(mut self, score: f64) -> Self {
        self.draft.score = Some(score);
        self
    }

    /// Set the sub-label (e.g. the class a per-class score refers to).
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.draft.label = Some(label.into());
        self
    }

    /// Set the cross-validation fold values.
    #[must_use]
    pub fn folds(mut self, folds: impl Into<Vec<f64>>) -> Self {
        self.draft.folds = Some(folds.into());
        self
    }

    /// Set a custom creation timestamp (useful for imports/testing).
    #[must_use]
    pub const fn created_at(mut self, created: DateTime<Utc>) -> Self {
        self.draft.created = Some(created);
        self
    }

    /// Build the `NewScore` draft.
    #[must_use]
    pub fn build(self) -> NewScore {
        self.draft
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Estimator, ModelType};
    use chrono::TimeZone;

    fn forest() -> Estimator {
        Estimator::builder(ModelType::Classifier)
            .model_class("RandomForestClassifier")
            .created_at(Utc.with_ymd_and_hms(2016, 8, 2, 0, 0, 0).unwrap())
            .build()
            .into_estimator(EstimatorId::new(1))
    }

    #[test]
    fn test_display_plain() {
        let estimator = forest();
        let score = Score::builder(estimator.id(), Metric::F1)
            .score(0.87654)
            .build()
            .into_score(ScoreId::new(1));

        assert_eq!(
            score.display(estimator.display(Some("bbengfort"))).to_string(),
            "F1 score for RandomForestClassifier Classifier (2016-08-02) for bbengfort = 0.877"
        );
    }

    #[test]
    fn test_display_with_label() {
        let estimator = forest();
        let score = Score::builder(estimator.id(), Metric::Precision)
            .score(0.5)
            .label("spam ham")
            .build()
            .into_score(ScoreId::new(2));

        assert_eq!(
            score.display(estimator.display(None)).to_string(),
            "Spam Ham Precision score for RandomForestClassifier Classifier (2016-08-02) = 0.500"
        );
    }

    #[test]
    fn test_display_missing_value() {
        let estimator = forest();
        let score = Score::builder(estimator.id(), Metric::Time)
            .build()
            .into_score(ScoreId::new(3));

        assert!(score
            .display(estimator.display(None))
            .to_string()
            .ends_with("= n/a"));
    }

    #[test]
    fn test_display_nan_value() {
        let estimator = forest();
        let score = Score::builder(estimator.id(), Metric::Logloss)
            .score(f64::NAN)
            .build()
            .into_score(ScoreId::new(4));

        assert!(score
            .display(estimator.display(None))
            .to_string()
            .ends_with("= nan"));
    }

    #[test]
    fn test_fold_mean() {
        let score = Score::builder(EstimatorId::new(1), Metric::Accuracy)
            .folds(vec![0.8, 0.9, 1.0])
            .build()
            .into_score(ScoreId::new(1));
        assert!((score.fold_mean().unwrap() - 0.9).abs() < 1e-12);

        let empty = Score::builder(EstimatorId::new(1), Metric::Accuracy)
            .folds(Vec::<f64>::new())
            .build()
            .into_score(ScoreId::new(2));
        assert!(empty.fold_mean().is_none());
    }

    #[test]
    fn test_validate_label_length() {
        let score = Score::builder(EstimatorId::new(1), Metric::Recall)
            .label("l".repeat(LABEL_MAX_LEN + 1))
            .build()
            .into_score(ScoreId::new(1));
        assert!(score.validate().is_err());
    }
}

//! Metric - the fixed set of evaluation criteria a score can report

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ModelType;
use crate::text::title_case;
use crate::Error;

/// Evaluation metric name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[allow(missing_docs)]
pub enum Metric {
    // Classification
    Accuracy,
    Auc,
    Brier,
    F1,
    Fbeta,
    Hamming,
    Hinge,
    Jaccard,
    Logloss,
    Mcc,
    Precision,
    Recall,
    Roc,
    Support,
    // Regression
    Mae,
    Mse,
    Mdae,
    R2,
    // Clustering
    Rand,
    Completeness,
    Homogeneity,
    Mutual,
    Silhouette,
    V,
    // Any model
    Time,
}

impl Metric {
    /// Every metric, in declaration order.
    pub const ALL: [Self; 25] = [
        Self::Accuracy,
        Self::Auc,
        Self::Brier,
        Self::F1,
        Self::Fbeta,
        Self::Hamming,
        Self::Hinge,
        Self::Jaccard,
        Self::Logloss,
        Self::Mcc,
        Self::Precision,
        Self::Recall,
        Self::Roc,
        Self::Support,
        Self::Mae,
        Self::Mse,
        Self::Mdae,
        Self::R2,
        Self::Rand,
        Self::Completeness,
        Self::Homogeneity,
        Self::Mutual,
        Self::Silhouette,
        Self::V,
        Self::Time,
    ];

    /// Get the stored column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Accuracy => "accuracy",
            Self::Auc => "auc",
            Self::Brier => "brier",
            Self::F1 => "f1",
            Self::Fbeta => "fbeta",
            Self::Hamming => "hamming",
            Self::Hinge => "hinge",
            Self::Jaccard => "jaccard",
            Self::Logloss => "logloss",
            Self::Mcc => "mcc",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::Roc => "roc",
            Self::Support => "support",
            Self::Mae => "mae",
            Self::Mse => "mse",
            Self::Mdae => "mdae",
            Self::R2 => "r2",
            Self::Rand => "rand",
            Self::Completeness => "completeness",
            Self::Homogeneity => "homogeneity",
            Self::Mutual => "mutual",
            Self::Silhouette => "silhouette",
            Self::V => "v",
            Self::Time => "time",
        }
    }

    /// Get the title-cased display name (e.g. `F1`, `Logloss`).
    #[must_use]
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }

    /// Model type whose evaluations conventionally report this metric.
    ///
    /// Advisory only: the store never rejects a score whose metric belongs
    /// to a different family than its estimator. `Time` applies to every
    /// model type and returns `None`.
    #[must_use]
    pub const fn family(&self) -> Option<ModelType> {
        match self {
            Self::Accuracy
            | Self::Auc
            | Self::Brier
            | Self::F1
            | Self::Fbeta
            | Self::Hamming
            | Self::Hinge
            | Self::Jaccard
            | Self::Logloss
            | Self::Mcc
            | Self::Precision
            | Self::Recall
            | Self::Roc
            | Self::Support => Some(ModelType::Classifier),
            Self::Mae | Self::Mse | Self::Mdae | Self::R2 => Some(ModelType::Regression),
            Self::Rand
            | Self::Completeness
            | Self::Homogeneity
            | Self::Mutual
            | Self::Silhouette
            | Self::V => Some(ModelType::Clusters),
            Self::Time => None,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| Error::InvalidChoice {
                field: "metric",
                value: s.to_string(),
            })
    }
}

impl TryFrom<&str> for Metric {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_parse_all() {
        for metric in Metric::ALL {
            assert_eq!(metric.as_str().parse::<Metric>().unwrap(), metric);
        }
    }

    #[test]
    fn test_metric_serde_matches_column_value() {
        for metric in Metric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));
        }
    }

    #[test]
    fn test_metric_rejects_unknown() {
        let err = Metric::try_from("rmse").unwrap_err();
        assert!(matches!(err, Error::InvalidChoice { field: "metric", .. }));
    }

    #[test]
    fn test_metric_title() {
        assert_eq!(Metric::F1.title(), "F1");
        assert_eq!(Metric::R2.title(), "R2");
        assert_eq!(Metric::Logloss.title(), "Logloss");
        assert_eq!(Metric::V.title(), "V");
    }

    #[test]
    fn test_metric_family() {
        assert_eq!(Metric::Accuracy.family(), Some(ModelType::Classifier));
        assert_eq!(Metric::Mse.family(), Some(ModelType::Regression));
        assert_eq!(Metric::Silhouette.family(), Some(ModelType::Clusters));
        assert_eq!(Metric::Time.family(), None);
    }
}

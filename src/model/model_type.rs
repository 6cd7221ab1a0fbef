//! Model Type - estimator category used to pick evaluation criteria

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::text::title_case;
use crate::Error;

/// Category of a trained estimator.
///
/// Stored as its lowercase name; anything outside the four categories is
/// rejected on parse and on deserialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelType {
    /// Supervised classification.
    Classifier,
    /// Supervised regression.
    Regression,
    /// Unsupervised clustering.
    Clusters,
    /// Matrix decomposition / dimensionality reduction.
    Decomposition,
}

impl ModelType {
    /// Every model type, in declaration order.
    pub const ALL: [Self; 4] = [
        Self::Classifier,
        Self::Regression,
        Self::Clusters,
        Self::Decomposition,
    ];

    /// Get the stored column value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Classifier => "classifier",
            Self::Regression => "regression",
            Self::Clusters => "clusters",
            Self::Decomposition => "decomposition",
        }
    }

    /// Get the title-cased display name (e.g. `Classifier`).
    #[must_use]
    pub fn title(&self) -> String {
        title_case(self.as_str())
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| Error::InvalidChoice {
                field: "model_type",
                value: s.to_string(),
            })
    }
}

impl TryFrom<&str> for ModelType {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

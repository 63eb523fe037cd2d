//! The four trainers and the tag that selects between them.

pub mod decision_tree;
pub mod kmeans;
pub mod linear;
pub mod logistic;

pub use decision_tree::{Boundary, Bounds, DecisionTree, DecisionTreeResult, TreeNode};
pub use kmeans::{KMeansResult, KMeansSnapshot};
pub use linear::{LinearRegressionResult, LinearSnapshot};
pub use logistic::{LogisticRegressionResult, LogisticSnapshot};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::SimError;

/// Supported algorithms, tagged as `linearRegression`, `logisticRegression`,
/// `kMeansClustering` and `decisionTree`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Algorithm {
    #[default]
    #[serde(alias = "linear_regression")]
    LinearRegression,
    #[serde(alias = "logistic_regression")]
    LogisticRegression,
    #[serde(alias = "k_means_clustering", alias = "kmeans")]
    KMeansClustering,
    #[serde(alias = "decision_tree")]
    DecisionTree,
}

impl Algorithm {
    pub const ALL: [Algorithm; 4] = [
        Algorithm::LinearRegression,
        Algorithm::LogisticRegression,
        Algorithm::KMeansClustering,
        Algorithm::DecisionTree,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::LinearRegression => "linearRegression",
            Self::LogisticRegression => "logisticRegression",
            Self::KMeansClustering => "kMeansClustering",
            Self::DecisionTree => "decisionTree",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Algorithm {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "linearRegression" | "linear_regression" => Ok(Self::LinearRegression),
            "logisticRegression" | "logistic_regression" => Ok(Self::LogisticRegression),
            "kMeansClustering" | "k_means_clustering" | "kmeans" => Ok(Self::KMeansClustering),
            "decisionTree" | "decision_tree" => Ok(Self::DecisionTree),
            other => Err(SimError::unsupported(other)),
        }
    }
}

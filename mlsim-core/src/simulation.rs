//! Single entry point that routes a run to the matching trainer.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::algorithms::{
    Algorithm, DecisionTreeResult, KMeansResult, LinearRegressionResult,
    LogisticRegressionResult, decision_tree, kmeans, linear, logistic,
};
use crate::data::{DataPoint, Parameters};
use crate::error::{SimError, ensure_not_empty};
use crate::training::ProgressReporter;

/// Outcome of one run, tagged with the algorithm that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "camelCase")]
pub enum SimulationResult {
    LinearRegression(LinearRegressionResult),
    LogisticRegression(LogisticRegressionResult),
    KMeansClustering(KMeansResult),
    DecisionTree(DecisionTreeResult),
}

impl SimulationResult {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            Self::LinearRegression(_) => Algorithm::LinearRegression,
            Self::LogisticRegression(_) => Algorithm::LogisticRegression,
            Self::KMeansClustering(_) => Algorithm::KMeansClustering,
            Self::DecisionTree(_) => Algorithm::DecisionTree,
        }
    }

    /// Per-point outputs: predicted values, labels, or cluster assignments.
    pub fn predictions_len(&self) -> usize {
        match self {
            Self::LinearRegression(r) => r.predictions.len(),
            Self::LogisticRegression(r) => r.predictions.len(),
            Self::KMeansClustering(r) => r.assignments.len(),
            Self::DecisionTree(r) => r.predictions.len(),
        }
    }

    /// Zero-based iteration index of every recorded snapshot. A decision tree
    /// keeps no history.
    pub fn history_iterations(&self) -> Vec<usize> {
        match self {
            Self::LinearRegression(r) => r.history.iter().map(|h| h.iteration).collect(),
            Self::LogisticRegression(r) => r.history.iter().map(|h| h.iteration).collect(),
            Self::KMeansClustering(r) => r.history.iter().map(|h| h.iteration).collect(),
            Self::DecisionTree(_) => Vec::new(),
        }
    }

    pub fn history_len(&self) -> usize {
        self.history_iterations().len()
    }

    /// One-line headline metrics.
    pub fn summary(&self) -> String {
        match self {
            Self::LinearRegression(r) => format!(
                "slope={:.4} intercept={:.4} mse={:.6} r2={:.4}",
                r.slope, r.intercept, r.mse, r.r2
            ),
            Self::LogisticRegression(r) => format!(
                "accuracy={:.4} precision={:.4} recall={:.4} f1={:.4}",
                r.accuracy, r.precision, r.recall, r.f1
            ),
            Self::KMeansClustering(r) => format!(
                "clusters={} iterations={} inertia={:.4} silhouette={:.4}",
                r.clusters, r.iterations, r.inertia, r.silhouette
            ),
            Self::DecisionTree(r) => format!(
                "accuracy={:.4} depth={} nodes={} gini={:.4}",
                r.accuracy, r.depth, r.nodes, r.gini
            ),
        }
    }

    pub fn to_json(&self, pretty: bool) -> Result<String, SimError> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Run `algorithm` over `data` to completion.
///
/// `reporter` sees strictly increasing 1-based iteration numbers, and the
/// run yields to the async scheduler after each report. `rng` drives every
/// random choice, so a seeded generator makes the run reproducible.
pub async fn run_simulation<R: Rng + ?Sized>(
    algorithm: Algorithm,
    data: &[DataPoint],
    parameters: &Parameters,
    reporter: &mut dyn ProgressReporter,
    rng: &mut R,
) -> Result<SimulationResult, SimError> {
    ensure_not_empty(data)?;
    tracing::info!(
        %algorithm,
        points = data.len(),
        iterations = parameters.iterations,
        "starting simulation"
    );

    let result = match algorithm {
        Algorithm::LinearRegression => SimulationResult::LinearRegression(
            linear::train(data, parameters, reporter, rng).await?,
        ),
        Algorithm::LogisticRegression => SimulationResult::LogisticRegression(
            logistic::train(data, parameters, reporter, rng).await?,
        ),
        Algorithm::KMeansClustering => SimulationResult::KMeansClustering(
            kmeans::train(data, parameters, reporter, rng).await?,
        ),
        Algorithm::DecisionTree => {
            SimulationResult::DecisionTree(decision_tree::train(data, parameters, reporter).await?)
        }
    };

    tracing::info!(%algorithm, summary = %result.summary(), "simulation finished");
    Ok(result)
}

/// Like [`run_simulation`], with the algorithm given by its text tag.
///
/// Fails with [`SimError::UnsupportedAlgorithm`] for an unknown tag.
pub async fn run_simulation_by_name<R: Rng + ?Sized>(
    algorithm: &str,
    data: &[DataPoint],
    parameters: &Parameters,
    reporter: &mut dyn ProgressReporter,
    rng: &mut R,
) -> Result<SimulationResult, SimError> {
    let algorithm: Algorithm = algorithm.parse()?;
    run_simulation(algorithm, data, parameters, reporter, rng).await
}

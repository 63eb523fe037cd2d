//! Linear regression `y = slope * x + intercept` fitted by gradient descent.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{DataPoint, Parameters};
use crate::error::{SimError, ensure_not_empty};
use crate::training::callbacks::{ProgressReporter, ProgressTracker, should_report};
use crate::training::metrics::{mean_squared_error, r_squared};

/// Model state after one gradient step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearSnapshot {
    pub iteration: usize,
    pub slope: f64,
    pub intercept: f64,
    /// Mean squared error measured before the step.
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearRegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub mse: f64,
    pub r2: f64,
    pub predictions: Vec<f64>,
    pub history: Vec<LinearSnapshot>,
}

/// Fit a line through `data` with one full-batch gradient step per iteration.
///
/// L2 regularization applies to the slope only.
#[tracing::instrument(skip_all, fields(points = data.len(), iterations = params.iterations))]
pub async fn train<R: Rng + ?Sized>(
    data: &[DataPoint],
    params: &Parameters,
    reporter: &mut dyn ProgressReporter,
    rng: &mut R,
) -> Result<LinearRegressionResult, SimError> {
    ensure_not_empty(data)?;
    let mut progress = ProgressTracker::new(reporter);
    let n = data.len() as f64;

    let mut slope: f64 = rng.gen_range(-1.0..1.0);
    let mut intercept: f64 = rng.gen_range(-1.0..1.0);
    let mut history = Vec::with_capacity(params.iterations);

    for i in 0..params.iterations {
        if should_report(i, params.iterations) {
            progress.report(i + 1).await;
        }

        let (mut slope_gradient, mut intercept_gradient, mut loss) = (0.0, 0.0, 0.0);
        for point in data {
            let error = slope * point.x + intercept - point.y;
            slope_gradient += error * point.x;
            intercept_gradient += error;
            loss += error * error;
        }
        slope_gradient = slope_gradient / n + params.regularization * slope;
        intercept_gradient /= n;
        loss /= n;

        slope -= params.learning_rate * slope_gradient;
        intercept -= params.learning_rate * intercept_gradient;

        history.push(LinearSnapshot {
            iteration: i,
            slope,
            intercept,
            loss,
        });
    }

    let predictions: Vec<f64> = data.iter().map(|p| slope * p.x + intercept).collect();
    let targets: Vec<f64> = data.iter().map(|p| p.y).collect();
    let mse = mean_squared_error(&predictions, &targets);
    let r2 = r_squared(&predictions, &targets);

    tracing::info!(slope, intercept, mse, r2, "linear regression finished");

    Ok(LinearRegressionResult {
        slope,
        intercept,
        mse,
        r2,
        predictions,
        history,
    })
}

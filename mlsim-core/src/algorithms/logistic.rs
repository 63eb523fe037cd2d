//! Two-feature logistic regression fitted by gradient descent on
//! binary cross-entropy.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::data::{DataPoint, Parameters};
use crate::error::{SimError, ensure_not_empty};
use crate::training::callbacks::{ProgressReporter, ProgressTracker, should_report};
use crate::training::metrics::ConfusionMatrix;

const THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogisticSnapshot {
    pub iteration: usize,
    pub weights: [f64; 2],
    pub bias: f64,
    /// Mean cross-entropy measured before the step.
    pub loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticRegressionResult {
    pub weights: [f64; 2],
    pub bias: f64,
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub predictions: Vec<u8>,
    pub probabilities: Vec<f64>,
    pub history: Vec<LogisticSnapshot>,
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Log loss of one prediction. Only the term for the true class is
/// evaluated, so a saturated correct prediction scores 0 rather than NaN.
fn cross_entropy(p: f64, target: u8) -> f64 {
    if target == 1 { -p.ln() } else { -(1.0 - p).ln() }
}

fn probability(weights: &[f64; 2], bias: f64, point: &DataPoint) -> f64 {
    sigmoid(weights[0] * point.x + weights[1] * point.y + bias)
}

/// Fit `p = sigmoid(w0 * x + w1 * y + b)`; L2 regularization applies to both
/// weights but not the bias.
#[tracing::instrument(skip_all, fields(points = data.len(), iterations = params.iterations))]
pub async fn train<R: Rng + ?Sized>(
    data: &[DataPoint],
    params: &Parameters,
    reporter: &mut dyn ProgressReporter,
    rng: &mut R,
) -> Result<LogisticRegressionResult, SimError> {
    ensure_not_empty(data)?;
    let mut progress = ProgressTracker::new(reporter);
    let n = data.len() as f64;

    let mut weights: [f64; 2] = [rng.gen_range(-0.1..0.1), rng.gen_range(-0.1..0.1)];
    let mut bias: f64 = rng.gen_range(-0.1..0.1);
    let mut history = Vec::with_capacity(params.iterations);

    for i in 0..params.iterations {
        if should_report(i, params.iterations) {
            progress.report(i + 1).await;
        }

        let mut weight_gradients = [0.0, 0.0];
        let (mut bias_gradient, mut loss) = (0.0, 0.0);
        for point in data {
            let p = probability(&weights, bias, point);
            let target = point.target();
            let error = p - f64::from(target);
            weight_gradients[0] += error * point.x;
            weight_gradients[1] += error * point.y;
            bias_gradient += error;
            loss += cross_entropy(p, target);
        }

        for (w, g) in weights.iter_mut().zip(weight_gradients) {
            *w -= params.learning_rate * (g / n + params.regularization * *w);
        }
        bias -= params.learning_rate * bias_gradient / n;

        history.push(LogisticSnapshot {
            iteration: i,
            weights,
            bias,
            loss: loss / n,
        });
    }

    let probabilities: Vec<f64> = data
        .iter()
        .map(|p| probability(&weights, bias, p))
        .collect();
    let predictions: Vec<u8> = probabilities
        .iter()
        .map(|&p| u8::from(p >= THRESHOLD))
        .collect();
    let matrix = ConfusionMatrix::from_pairs(
        data.iter()
            .map(DataPoint::target)
            .zip(predictions.iter().copied()),
    );

    tracing::info!(
        accuracy = matrix.accuracy(),
        f1 = matrix.f1(),
        "logistic regression finished"
    );

    Ok(LogisticRegressionResult {
        weights,
        bias,
        accuracy: matrix.accuracy(),
        precision: matrix.precision(),
        recall: matrix.recall(),
        f1: matrix.f1(),
        predictions,
        probabilities,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::training::NoProgress;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn separated() -> Vec<DataPoint> {
        (0..20)
            .map(|i| {
                if i % 2 == 0 {
                    DataPoint::labeled(-2.0, -2.0, 0)
                } else {
                    DataPoint::labeled(2.0, 2.0, 1)
                }
            })
            .collect()
    }

    #[test]
    fn test_sigmoid() {
        assert_eq!(sigmoid(0.0), 0.5);
        assert!(sigmoid(10.0) > 0.99);
        assert!(sigmoid(-10.0) < 0.01);
    }

    #[tokio::test]
    async fn test_separates_two_clusters() {
        let data = separated();
        let result = train(
            &data,
            &Parameters::new(0.1, 100),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(4),
        )
        .await
        .unwrap();
        assert_eq!(result.accuracy, 1.0);
        assert_eq!(result.precision, 1.0);
        assert_eq!(result.recall, 1.0);
        assert_eq!(result.f1, 1.0);
        assert_eq!(result.predictions.len(), data.len());
        assert!(result.weights[0] > 0.0 && result.weights[1] > 0.0);
    }

    #[test]
    fn test_cross_entropy_of_saturated_predictions() {
        assert_eq!(cross_entropy(1.0, 1), 0.0);
        assert_eq!(cross_entropy(0.0, 0), 0.0);
        assert!((cross_entropy(0.5, 1) - std::f64::consts::LN_2).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_saturated_fit_keeps_loss_finite() {
        let data: Vec<DataPoint> = (0..10)
            .map(|i| {
                if i % 2 == 0 {
                    DataPoint::labeled(-1000.0, -1000.0, 0)
                } else {
                    DataPoint::labeled(1000.0, 1000.0, 1)
                }
            })
            .collect();
        let result = train(
            &data,
            &Parameters::new(0.1, 10),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(13),
        )
        .await
        .unwrap();
        assert_eq!(result.accuracy, 1.0);
        assert!(result.history.iter().all(|h| !h.loss.is_nan()));
        let last = result.history.last().unwrap().loss;
        assert!(last.is_finite() && last < 1e-6, "final loss {last}");
    }

    #[tokio::test]
    async fn test_loss_decreases() {
        let data = separated();
        let result = train(
            &data,
            &Parameters::new(0.1, 50),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(8),
        )
        .await
        .unwrap();
        let first = result.history.first().unwrap().loss;
        let last = result.history.last().unwrap().loss;
        assert!(last < first, "loss went from {first} to {last}");
    }

    #[tokio::test]
    async fn test_history_holds_weight_copies() {
        let data = separated();
        let result = train(
            &data,
            &Parameters::new(0.1, 10),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(6),
        )
        .await
        .unwrap();
        let weights: Vec<[f64; 2]> = result.history.iter().map(|h| h.weights).collect();
        assert!(weights.windows(2).all(|w| w[0] != w[1]));
        assert_eq!(*weights.last().unwrap(), result.weights);
    }

    #[tokio::test]
    async fn test_single_class_has_zero_precision_and_recall() {
        let data = vec![DataPoint::new(-1.0, -1.0), DataPoint::new(-2.0, -1.5)];
        let result = train(
            &data,
            &Parameters::new(0.5, 100),
            &mut NoProgress,
            &mut StdRng::seed_from_u64(2),
        )
        .await
        .unwrap();
        assert_eq!(result.predictions, vec![0, 0]);
        assert_eq!(result.precision, 0.0);
        assert_eq!(result.recall, 0.0);
        assert_eq!(result.f1, 0.0);
        assert_eq!(result.accuracy, 1.0);
    }
}

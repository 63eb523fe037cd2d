//! Evaluation metrics shared by the trainers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::data::DataPoint;

/// Binary confusion matrix with class 1 as the positive class.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positive: usize,
    pub true_negative: usize,
    pub false_positive: usize,
    pub false_negative: usize,
}

impl ConfusionMatrix {
    /// Tally `(actual, predicted)` label pairs.
    pub fn from_pairs(pairs: impl IntoIterator<Item = (u8, u8)>) -> Self {
        let mut matrix = Self::default();
        for (actual, predicted) in pairs {
            match (actual == 1, predicted == 1) {
                (true, true) => matrix.true_positive += 1,
                (false, false) => matrix.true_negative += 1,
                (false, true) => matrix.false_positive += 1,
                (true, false) => matrix.false_negative += 1,
            }
        }
        matrix
    }

    pub fn total(&self) -> usize {
        self.true_positive + self.true_negative + self.false_positive + self.false_negative
    }

    pub fn accuracy(&self) -> f64 {
        (self.true_positive + self.true_negative) as f64 / self.total() as f64
    }

    pub fn precision(&self) -> f64 {
        ratio_or_zero(
            self.true_positive as f64,
            (self.true_positive + self.false_positive) as f64,
        )
    }

    pub fn recall(&self) -> f64 {
        ratio_or_zero(
            self.true_positive as f64,
            (self.true_positive + self.false_negative) as f64,
        )
    }

    pub fn f1(&self) -> f64 {
        let (precision, recall) = (self.precision(), self.recall());
        ratio_or_zero(2.0 * precision * recall, precision + recall)
    }
}

fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

/// Count occurrences of each label, in ascending label order.
pub fn label_counts(labels: impl IntoIterator<Item = u8>) -> BTreeMap<u8, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

/// Gini impurity `1 - sum(p_c^2)`; 0 for an empty set.
pub fn gini_impurity(labels: impl IntoIterator<Item = u8>) -> f64 {
    let counts = label_counts(labels);
    let total: usize = counts.values().sum();
    if total == 0 {
        return 0.0;
    }
    let total = total as f64;
    1.0 - counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            p * p
        })
        .sum::<f64>()
}

/// Most frequent label; ties go to the lowest label, and an empty set to 0.
pub fn majority_label(labels: impl IntoIterator<Item = u8>) -> u8 {
    let mut best = (0, 0);
    for (label, count) in label_counts(labels) {
        if count > best.1 {
            best = (label, count);
        }
    }
    best.0
}

pub fn mean(values: impl IntoIterator<Item = f64>) -> f64 {
    let (sum, n) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));
    sum / n as f64
}

pub fn mean_squared_error(predictions: &[f64], targets: &[f64]) -> f64 {
    mean(
        predictions
            .iter()
            .zip(targets)
            .map(|(p, t)| (p - t) * (p - t)),
    )
}

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// A constant target makes `SS_tot` zero and the result non-finite.
pub fn r_squared(predictions: &[f64], targets: &[f64]) -> f64 {
    let target_mean = mean(targets.iter().copied());
    let total: f64 = targets.iter().map(|t| (t - target_mean).powi(2)).sum();
    let residual: f64 = predictions
        .iter()
        .zip(targets)
        .map(|(p, t)| (t - p).powi(2))
        .sum();
    1.0 - residual / total
}

pub fn euclidean(a: &DataPoint, b: &DataPoint) -> f64 {
    squared_distance(a, b).sqrt()
}

pub fn squared_distance(a: &DataPoint, b: &DataPoint) -> f64 {
    let (dx, dy) = (a.x - b.x, a.y - b.y);
    dx * dx + dy * dy
}

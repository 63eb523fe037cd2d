//! Lloyd's k-means with early stopping and a simplified silhouette score.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

use crate::data::{DataPoint, Parameters};
use crate::error::{SimError, ensure_not_empty};
use crate::training::callbacks::{ProgressReporter, ProgressTracker};
use crate::training::metrics::{euclidean, squared_distance};

pub const DEFAULT_CLUSTERS: usize = 3;

/// Largest per-axis centroid movement still treated as converged.
pub const CONVERGENCE_TOLERANCE: f64 = 0.001;

/// Centroids used for the assignment step of one iteration, with the inertia
/// of that assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansSnapshot {
    pub iteration: usize,
    pub centroids: Vec<DataPoint>,
    pub inertia: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KMeansResult {
    pub centroids: Vec<DataPoint>,
    /// Index into `centroids` for every input point.
    pub assignments: Vec<usize>,
    pub inertia: f64,
    pub silhouette: f64,
    /// Iterations actually run; equals `history.len()`.
    pub iterations: usize,
    pub clusters: usize,
    pub history: Vec<KMeansSnapshot>,
}

/// Index of the nearest centroid; ties go to the lowest index.
pub fn nearest_centroid(point: &DataPoint, centroids: &[DataPoint]) -> usize {
    let mut best = (0, f64::INFINITY);
    for (i, centroid) in centroids.iter().enumerate() {
        let distance = euclidean(point, centroid);
        if distance < best.1 {
            best = (i, distance);
        }
    }
    best.0
}

fn assign(data: &[DataPoint], centroids: &[DataPoint]) -> Vec<usize> {
    data.iter().map(|p| nearest_centroid(p, centroids)).collect()
}

/// Mean of each cluster's members; an empty cluster keeps its centroid.
fn recompute(data: &[DataPoint], assignments: &[usize], centroids: &[DataPoint]) -> Vec<DataPoint> {
    let mut sums = vec![(0.0, 0.0, 0usize); centroids.len()];
    for (point, &cluster) in data.iter().zip(assignments) {
        let entry = &mut sums[cluster];
        entry.0 += point.x;
        entry.1 += point.y;
        entry.2 += 1;
    }
    sums.into_iter()
        .zip(centroids)
        .map(|((sx, sy, count), old)| {
            if count == 0 {
                *old
            } else {
                DataPoint::new(sx / count as f64, sy / count as f64)
            }
        })
        .collect()
}

pub fn inertia(data: &[DataPoint], centroids: &[DataPoint], assignments: &[usize]) -> f64 {
    data.iter()
        .zip(assignments)
        .map(|(p, &cluster)| squared_distance(p, &centroids[cluster]))
        .sum()
}

fn has_moved(before: &[DataPoint], after: &[DataPoint]) -> bool {
    before.iter().zip(after).any(|(a, b)| {
        (a.x - b.x).abs() > CONVERGENCE_TOLERANCE || (a.y - b.y).abs() > CONVERGENCE_TOLERANCE
    })
}

/// Cluster `data` into `parameters.clusters` groups (3 by default).
///
/// Initial centroids are sampled from the data with replacement. Each
/// iteration assigns points to the current centroids, recomputes the means,
/// and records the inertia of the assignment against the centroids it was
/// made with. The run stops early once no centroid moves more than
/// [`CONVERGENCE_TOLERANCE`] on either axis.
#[tracing::instrument(skip_all, fields(points = data.len(), iterations = params.iterations))]
pub async fn train<R: Rng + ?Sized>(
    data: &[DataPoint],
    params: &Parameters,
    reporter: &mut dyn ProgressReporter,
    rng: &mut R,
) -> Result<KMeansResult, SimError> {
    ensure_not_empty(data)?;
    let mut progress = ProgressTracker::new(reporter);
    let k = params.clusters.map_or(DEFAULT_CLUSTERS, NonZeroUsize::get);

    let mut centroids: Vec<DataPoint> = (0..k)
        .map(|_| data[rng.gen_range(0..data.len())].position())
        .collect();
    let mut assignments = assign(data, &centroids);
    let mut current_inertia = inertia(data, &centroids, &assignments);
    let mut history = Vec::new();

    for iteration in 0..params.iterations {
        progress.report(iteration + 1).await;

        assignments = assign(data, &centroids);
        let updated = recompute(data, &assignments, &centroids);
        current_inertia = inertia(data, &centroids, &assignments);

        history.push(KMeansSnapshot {
            iteration,
            centroids: centroids.clone(),
            inertia: current_inertia,
        });

        if !has_moved(&centroids, &updated) {
            tracing::debug!(iteration, "k-means converged");
            break;
        }
        centroids = updated;
    }

    let silhouette = silhouette(data, &assignments, k);
    tracing::info!(
        clusters = k,
        iterations = history.len(),
        inertia = current_inertia,
        silhouette,
        "k-means finished"
    );

    Ok(KMeansResult {
        centroids,
        assignments,
        inertia: current_inertia,
        silhouette,
        iterations: history.len(),
        clusters: k,
        history,
    })
}

/// Simplified silhouette: mean over points of `(b - a) / max(a, b)`.
///
/// `a` is the mean distance to the other members of the point's cluster, `b`
/// the smallest mean distance to another non-empty cluster. A point alone in
/// its cluster, or with no other non-empty cluster to compare against,
/// contributes 0.
pub fn silhouette(data: &[DataPoint], assignments: &[usize], k: usize) -> f64 {
    let mut total = 0.0;
    for (i, point) in data.iter().enumerate() {
        let own = assignments[i];
        let mut sums = vec![(0.0, 0usize); k];
        for (j, other) in data.iter().enumerate() {
            if i == j {
                continue;
            }
            let entry = &mut sums[assignments[j]];
            entry.0 += euclidean(point, other);
            entry.1 += 1;
        }

        let (own_sum, own_count) = sums[own];
        if own_count == 0 {
            continue;
        }
        let a = own_sum / own_count as f64;
        let b = sums
            .iter()
            .enumerate()
            .filter(|&(cluster, &(_, count))| cluster != own && count > 0)
            .map(|(_, &(sum, count))| sum / count as f64)
            .fold(f64::INFINITY, f64::min);

        let scale = a.max(b);
        if scale.is_finite() && scale > 0.0 {
            total += (b - a) / scale;
        }
    }
    total / data.len() as f64
}

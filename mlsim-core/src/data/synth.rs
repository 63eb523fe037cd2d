//! Synthetic 2-D datasets shaped for each algorithm.

use rand::Rng;

use crate::algorithms::Algorithm;
use crate::data::DataPoint;

const SPAN: f64 = 5.0;
const CLASS_CENTERS: [(f64, f64); 2] = [(-2.0, -2.0), (2.0, 2.0)];
const BLOB_COUNT: usize = 3;

/// Generate `count` points tailored to `algorithm`.
///
/// `noise_level` scales the jitter for the continuous shapes and is the
/// label-flip probability for the quadrant grid.
pub fn generate<R: Rng + ?Sized>(
    algorithm: Algorithm,
    count: usize,
    noise_level: f64,
    rng: &mut R,
) -> Vec<DataPoint> {
    match algorithm {
        Algorithm::LinearRegression => linear_trend(count, noise_level, rng),
        Algorithm::LogisticRegression => two_classes(count, noise_level, rng),
        Algorithm::KMeansClustering => blobs(count, noise_level, rng),
        Algorithm::DecisionTree => quadrants(count, noise_level, rng),
    }
}

/// Exact points on `y = slope * x + intercept`.
pub fn linear_points(slope: f64, intercept: f64, xs: &[f64]) -> Vec<DataPoint> {
    xs.iter()
        .map(|&x| DataPoint::new(x, slope * x + intercept))
        .collect()
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, scale: f64) -> f64 {
    rng.gen_range(-1.0..1.0) * scale
}

fn linear_trend<R: Rng + ?Sized>(count: usize, noise_level: f64, rng: &mut R) -> Vec<DataPoint> {
    let slope = rng.gen_range(-1.0..1.0);
    let intercept = rng.gen_range(-2.0..2.0);

    (0..count)
        .map(|_| {
            let x = rng.gen_range(-SPAN..SPAN);
            let y = slope * x + intercept + jitter(rng, noise_level * 3.0);
            DataPoint::new(x, y)
        })
        .collect()
}

fn two_classes<R: Rng + ?Sized>(count: usize, noise_level: f64, rng: &mut R) -> Vec<DataPoint> {
    (0..count)
        .map(|i| {
            let label = (i % 2) as u8;
            let (cx, cy) = CLASS_CENTERS[i % 2];
            let x = cx + jitter(rng, noise_level * 4.0);
            let y = cy + jitter(rng, noise_level * 4.0);
            DataPoint::labeled(x, y, label)
        })
        .collect()
}

fn blobs<R: Rng + ?Sized>(count: usize, noise_level: f64, rng: &mut R) -> Vec<DataPoint> {
    let centers: Vec<(f64, f64)> = (0..BLOB_COUNT)
        .map(|_| (rng.gen_range(-SPAN..SPAN), rng.gen_range(-SPAN..SPAN)))
        .collect();

    (0..count)
        .map(|i| {
            let cluster = i % BLOB_COUNT;
            let (cx, cy) = centers[cluster];
            let x = cx + jitter(rng, noise_level * 3.0);
            let y = cy + jitter(rng, noise_level * 3.0);
            DataPoint::new(x, y).with_cluster(cluster)
        })
        .collect()
}

fn quadrants<R: Rng + ?Sized>(count: usize, noise_level: f64, rng: &mut R) -> Vec<DataPoint> {
    (0..count)
        .map(|_| {
            let x = rng.gen_range(-SPAN..SPAN);
            let y = rng.gen_range(-SPAN..SPAN);
            let mut label = quadrant_label(x, y);
            if rng.gen_range(0.0..1.0) < noise_level {
                label = 1 - label;
            }
            DataPoint::labeled(x, y, label)
        })
        .collect()
}

/// 1 in the second and fourth quadrants, 0 elsewhere (axes included).
pub fn quadrant_label(x: f64, y: f64) -> u8 {
    u8::from(x * y < 0.0)
}

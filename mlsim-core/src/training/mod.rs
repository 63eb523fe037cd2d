//! Training infrastructure: progress reporting, metrics and seeds.

pub mod callbacks;
pub mod metrics;
pub mod reproducibility;

pub use callbacks::{NoProgress, ProgressReporter, ProgressTracker};
pub use metrics::ConfusionMatrix;
pub use reproducibility::SeedManager;

//! Points, features, and run parameters.

use serde::{Deserialize, Deserializer, Serialize};
use std::num::NonZeroUsize;

/// A single 2-D observation.
///
/// `label` is read by the classifiers (absent means class 0). `cluster` is a
/// display annotation from the dataset synthesizer and is never read by a
/// trainer.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPoint {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<usize>,
}

impl DataPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            label: None,
            cluster: None,
        }
    }

    pub fn labeled(x: f64, y: f64, label: u8) -> Self {
        Self {
            label: Some(label),
            ..Self::new(x, y)
        }
    }

    pub fn with_cluster(self, cluster: usize) -> Self {
        Self {
            cluster: Some(cluster),
            ..self
        }
    }

    /// Class label used for training, defaulting to 0.
    pub fn target(&self) -> u8 {
        self.label.unwrap_or(0)
    }

    pub fn feature(&self, feature: Feature) -> f64 {
        match feature {
            Feature::X => self.x,
            Feature::Y => self.y,
        }
    }

    /// Same position, annotations stripped.
    pub fn position(&self) -> Self {
        Self::new(self.x, self.y)
    }
}

/// Input axis a decision node splits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    X,
    Y,
}

impl Feature {
    pub const ALL: [Feature; 2] = [Feature::X, Feature::Y];
}

/// Hyperparameters shared by every trainer.
///
/// Values are taken as given: a zero iteration count or a negative learning
/// rate is the caller's problem, not the engine's.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub learning_rate: f64,
    pub iterations: usize,
    pub regularization: f64,
    pub noise_level: f64,
    /// Cluster count for k-means; `None` (or 0 on input) means 3.
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "zero_as_unset"
    )]
    pub clusters: Option<NonZeroUsize>,
}

fn zero_as_unset<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<NonZeroUsize>, D::Error> {
    Ok(Option::<usize>::deserialize(deserializer)?.and_then(NonZeroUsize::new))
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            learning_rate: 0.01,
            iterations: 100,
            regularization: 0.0,
            noise_level: 0.2,
            clusters: None,
        }
    }
}

impl Parameters {
    pub fn new(learning_rate: f64, iterations: usize) -> Self {
        Self {
            learning_rate,
            iterations,
            ..Self::default()
        }
    }

    pub fn regularization(self, regularization: f64) -> Self {
        Self {
            regularization,
            ..self
        }
    }

    pub fn noise_level(self, noise_level: f64) -> Self {
        Self {
            noise_level,
            ..self
        }
    }

    pub fn clusters(self, clusters: usize) -> Self {
        Self {
            clusters: NonZeroUsize::new(clusters),
            ..self
        }
    }
}

//! Configuration for simulation runs.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! explicit config file -> environment -> overrides. The user file lives at
//! `<config dir>/mlsim/config.toml`.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::algorithms::Algorithm;
use crate::data::Parameters;
use crate::error::SimError;

/// Top-level configuration for one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Global seed; `None` draws one from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Synthetic dataset configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Number of points to synthesize.
    #[serde(default = "default_points")]
    pub points: usize,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            points: default_points(),
        }
    }
}

fn default_points() -> usize {
    50
}

/// Result output configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Pretty-print the result JSON.
    #[serde(default = "default_true")]
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { pretty: true }
    }
}

fn default_true() -> bool {
    true
}

impl SimulationConfig {
    /// Warnings for values the engine will accept but probably should not
    /// be given.
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        let p = &self.parameters;
        if p.iterations == 0 {
            warnings.push("parameters.iterations is 0; nothing will be trained".to_string());
        }
        if p.learning_rate <= 0.0 {
            warnings.push(format!(
                "parameters.learning_rate should be positive, got {}",
                p.learning_rate
            ));
        }
        if p.regularization < 0.0 {
            warnings.push(format!(
                "parameters.regularization should not be negative, got {}",
                p.regularization
            ));
        }
        if p.noise_level < 0.0 {
            warnings.push(format!(
                "parameters.noise_level should not be negative, got {}",
                p.noise_level
            ));
        }
        if self.dataset.points == 0 {
            warnings.push("dataset.points is 0; the run will be rejected".to_string());
        }
        if self.algorithm == Algorithm::DecisionTree && p.iterations < 10 {
            warnings.push(
                "decision trees need at least 10 iterations to grow past the root".to_string(),
            );
        }
        warnings
    }
}

/// Individual settings from the command line; unset fields leave the
/// layered value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub algorithm: Option<Algorithm>,
    pub seed: Option<u64>,
    pub points: Option<usize>,
    pub learning_rate: Option<f64>,
    pub iterations: Option<usize>,
    pub regularization: Option<f64>,
    pub noise_level: Option<f64>,
    pub clusters: Option<usize>,
    pub pretty: Option<bool>,
}

impl ConfigOverrides {
    fn apply(&self, mut figment: Figment) -> Figment {
        fn set<T: Serialize>(figment: Figment, key: &str, value: Option<T>) -> Figment {
            match value {
                Some(value) => figment.merge(Serialized::default(key, value)),
                None => figment,
            }
        }
        figment = set(figment, "algorithm", self.algorithm);
        figment = set(figment, "seed", self.seed);
        figment = set(figment, "dataset.points", self.points);
        figment = set(figment, "parameters.learning_rate", self.learning_rate);
        figment = set(figment, "parameters.iterations", self.iterations);
        figment = set(figment, "parameters.regularization", self.regularization);
        figment = set(figment, "parameters.noise_level", self.noise_level);
        figment = set(figment, "parameters.clusters", self.clusters);
        set(figment, "output.pretty", self.pretty)
    }
}

/// Load configuration from layered sources.
///
/// Priority (highest to lowest):
/// 1. Explicit overrides
/// 2. Environment variables (`MLSIM_PARAMETERS__ITERATIONS=200`, ...)
/// 3. The explicit config file, when given
/// 4. User config (`<config dir>/mlsim/config.toml`)
/// 5. Built-in defaults
pub fn load_config(
    config_file: Option<&Path>,
    overrides: &ConfigOverrides,
) -> Result<SimulationConfig, SimError> {
    let mut figment = Figment::from(Serialized::defaults(SimulationConfig::default()));

    if let Some(dirs) = directories::ProjectDirs::from("dev", "mlsim", "mlsim") {
        let user_config = dirs.config_dir().join("config.toml");
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(SimError::config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("MLSIM_").split("__"));
    figment = overrides.apply(figment);

    let config: SimulationConfig = figment.extract()?;
    tracing::debug!(?config, "configuration loaded");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = SimulationConfig::default();
        assert_eq!(config.algorithm, Algorithm::LinearRegression);
        assert_eq!(config.parameters.iterations, 100);
        assert_eq!(config.parameters.learning_rate, 0.01);
        assert_eq!(config.dataset.points, 50);
        assert!(config.output.pretty);
        assert!(config.seed.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_config_toml_roundtrip() {
        let config = SimulationConfig {
            algorithm: Algorithm::KMeansClustering,
            parameters: Parameters::new(0.1, 40).clusters(4),
            seed: Some(9),
            ..SimulationConfig::default()
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: SimulationConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: SimulationConfig = toml::from_str(
            r#"
            algorithm = "decision_tree"
            [dataset]
            points = 80
            "#,
        )
        .unwrap();
        assert_eq!(parsed.algorithm, Algorithm::DecisionTree);
        assert_eq!(parsed.dataset.points, 80);
        assert_eq!(parsed.parameters, Parameters::default());
    }

    #[test]
    fn test_validate_flags_misuse() {
        let mut config = SimulationConfig::default();
        config.parameters.iterations = 0;
        config.parameters.learning_rate = -1.0;
        config.algorithm = Algorithm::DecisionTree;
        let warnings = config.validate();
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn test_load_config_layers_file_and_overrides() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "algorithm = \"logisticRegression\"\nseed = 5\n\
             [parameters]\nlearning_rate = 0.2\niterations = 300\n\
             regularization = 0.0\nnoise_level = 0.1"
        )
        .unwrap();

        let overrides = ConfigOverrides {
            iterations: Some(50),
            clusters: Some(2),
            ..ConfigOverrides::default()
        };
        let config = load_config(Some(file.path()), &overrides).unwrap();
        assert_eq!(config.algorithm, Algorithm::LogisticRegression);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.parameters.learning_rate, 0.2);
        assert_eq!(config.parameters.iterations, 50);
        assert_eq!(config.parameters.clusters.map(|c| c.get()), Some(2));
    }

    #[test]
    fn test_zero_cluster_override_falls_back_to_default() {
        let overrides = ConfigOverrides {
            clusters: Some(0),
            ..ConfigOverrides::default()
        };
        let config = load_config(None, &overrides).unwrap();
        assert_eq!(config.parameters.clusters, None);
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = load_config(
            Some(Path::new("/nonexistent/mlsim.toml")),
            &ConfigOverrides::default(),
        )
        .unwrap_err();
        assert!(matches!(err, SimError::Config(_)));
    }
}

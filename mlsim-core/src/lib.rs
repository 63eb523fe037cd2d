//! # mlsim-core: interactive simulation engine for classical ML
//!
//! Runs one of four from-scratch trainers (linear regression, logistic
//! regression, k-means, decision tree) over a 2-D dataset, reporting progress
//! as it goes and returning final metrics together with a per-iteration
//! history that a renderer can replay.
//!
//! ```no_run
//! use mlsim_core::{Algorithm, NoProgress, Parameters, run_simulation};
//! use rand::SeedableRng;
//!
//! # async fn demo() -> Result<(), mlsim_core::SimError> {
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let data = mlsim_core::data::generate(Algorithm::KMeansClustering, 60, 0.2, &mut rng);
//! let params = Parameters::new(0.01, 50).clusters(3);
//! let result = run_simulation(
//!     Algorithm::KMeansClustering,
//!     &data,
//!     &params,
//!     &mut NoProgress,
//!     &mut rng,
//! )
//! .await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod algorithms;
pub mod config;
pub mod data;
pub mod error;
pub mod simulation;
pub mod training;

// Re-exports
pub use algorithms::Algorithm;
pub use config::{ConfigOverrides, SimulationConfig, load_config};
pub use data::{DataPoint, Feature, Parameters};
pub use error::SimError;
pub use simulation::{SimulationResult, run_simulation, run_simulation_by_name};
pub use training::{NoProgress, ProgressReporter, SeedManager};

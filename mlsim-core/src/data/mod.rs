//! Input data: points, parameters and the dataset synthesizer.

pub mod point;
pub mod synth;

pub use point::{DataPoint, Feature, Parameters};
pub use synth::{generate, linear_points};

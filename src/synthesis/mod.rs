//! Numeric gate synthesis
//!
//! Finds rotation angles for a fixed-shape {Rx, Rz, CZ} template whose unitary
//! matches a target gate up to global phase. Depth is escalated only when a
//! shallower template cannot reach zero residual.

use thiserror::Error;

pub mod config;
pub mod template;
pub mod objective;
pub mod minimize;
pub mod synthesizer;

pub use config::{config_from_seed, SynthesisConfig};
pub use template::{entries_from_angles, parameter_count, template_unitary, TemplateShape};
pub use objective::FitObjective;
pub use minimize::{BoundedMinimizer, BoundedNelderMead, Bounds, MinimizeResult, ProjectedLbfgs};
pub use synthesizer::{Synthesis, Synthesizer};

/// Errors raised while synthesizing a decomposition
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SynthesisError {
    /// No depth reached zero residual within the outer attempt cap
    #[error("no decomposition found after {attempts} attempts")]
    Exhausted { attempts: usize },

    /// The local optimizer never reported convergence within the restart cap
    #[error("optimizer did not converge at depth {depth} after {restarts} restarts")]
    OptimizerNonconvergence { depth: usize, restarts: usize },

    /// Target is not a 2x2 or 4x4 matrix
    #[error("target must be a 2x2 or 4x4 matrix, got {rows}x{cols}")]
    InvalidTarget { rows: usize, cols: usize },

    /// Depth outside 1..=3
    #[error("template depth {0} is outside 1..=3")]
    InvalidDepth(usize),

    /// Angle vector of the wrong length for its template
    #[error("expected {expected} angles for this template, got {actual}")]
    ParameterCount { expected: usize, actual: usize },

    /// Angle vector whose length matches no template of the shape
    #[error("no template takes {0} angles")]
    UnsupportedAngleCount(usize),
}

pub type Result<T> = std::result::Result<T, SynthesisError>;

/// Rounds to two decimal places
pub fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

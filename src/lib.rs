//! Universal gate-set compiler
//!
//! This crate rewrites circuits of named quantum gates into the {Rx, Rz, CZ}
//! gate set. Decompositions are found numerically by fitting fixed-shape
//! templates to each gate's unitary, bound to the qubits of every occurrence,
//! and the expanded circuit is shrunk by local rewrite rules.

pub mod quantum;
pub mod synthesis;
pub mod compiler;

// Create a prelude module for convenient imports
pub mod prelude {
    pub use crate::quantum::prelude::*;
    pub use crate::synthesis::{config_from_seed, Synthesis, SynthesisConfig, SynthesisError, Synthesizer};
    pub use crate::compiler::{compile, CircuitExpander, CircuitReducer, CompileError, DecompositionTable, ReductionRule};
}

// Version and crate information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CRATE_NAME: &str = env!("CARGO_PKG_NAME");

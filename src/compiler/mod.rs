//! Circuit compilation to the {Rx, Rz, CZ} gate set
//!
//! Expansion substitutes every source gate with its decomposition; reduction
//! then shrinks the long result with local rewrite rules.

use log::info;
use thiserror::Error;

use crate::quantum::circuit::{Circuit, GateOccurrence};
use crate::synthesis::{SynthesisError, Synthesizer};

pub mod table;
pub mod expander;
pub mod reducer;

pub use table::DecompositionTable;
pub use expander::CircuitExpander;
pub use reducer::{CircuitReducer, ReductionRule};

/// Errors that can occur while compiling a circuit
#[derive(Debug, Error)]
pub enum CompileError {
    /// Synthesis failed for a gate; the whole expansion is abandoned
    #[error("synthesis failed for {gate}: {source}")]
    Synthesis {
        gate: String,
        #[source]
        source: SynthesisError,
    },

    /// Occurrence names no primitive, table entry or synthesizable rotation
    #[error("unknown gate `{0}`")]
    UnknownGate(String),

    /// Occurrence has the wrong arity for its table entry
    #[error("`{name}` cannot be applied as {occurrence}")]
    ArityMismatch { name: String, occurrence: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CompileError>;

/// Expand `input` with `table`, then reduce to a fixpoint
pub fn compile(
    input: &[GateOccurrence],
    table: &DecompositionTable,
    synthesizer: &mut Synthesizer,
) -> Result<Circuit> {
    let expanded = CircuitExpander::new(table, synthesizer).expand(input)?;
    let reduced = CircuitReducer::default().reduce(&expanded);
    info!(
        "compiled {} occurrences: {} gates expanded, {} after reduction",
        input.len(),
        expanded.len(),
        reduced.len()
    );
    Ok(reduced)
}

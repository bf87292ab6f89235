// src/quantum/mod.rs
//! Quantum gates and circuits
//!
//! Closed-form gate matrices, the {Rx, Rz, CZ} circuit representation and the
//! input-circuit occurrences it is compiled from.

pub mod gate;
pub mod circuit;

pub use gate::{QuantumGate, StandardGate, ParametrizedGate};
pub use circuit::{Axis, Circuit, CircuitBuilder, GateEntry, GateOccurrence, TemplateEntry, equivalent_up_to_phase, source_unitary};

/// Re-export commonly used types and traits
pub mod prelude {
    pub use super::{QuantumGate, StandardGate, ParametrizedGate};
    pub use super::{Axis, Circuit, CircuitBuilder, GateEntry, GateOccurrence, TemplateEntry};
}

use std::collections::HashMap;
use log::debug;

use crate::quantum::circuit::{Axis, Circuit, GateEntry, GateOccurrence, TemplateEntry};
use crate::quantum::gate::{ParametrizedGate, QuantumGate};
use crate::synthesis::Synthesizer;
use super::table::{format_entries, DecompositionTable};
use super::{CompileError, Result};

/// Binds decompositions to the occurrences of an input circuit.
///
/// `Ry` has no table entry; it is synthesized per distinct angle and cached, so
/// binding a repeated rotation is a substitution rather than a new search.
pub struct CircuitExpander<'a> {
    table: &'a DecompositionTable,
    synthesizer: &'a mut Synthesizer,
    rotation_cache: HashMap<u64, Vec<TemplateEntry>>,
}

impl<'a> CircuitExpander<'a> {
    pub fn new(table: &'a DecompositionTable, synthesizer: &'a mut Synthesizer) -> Self {
        CircuitExpander {
            table,
            synthesizer,
            rotation_cache: HashMap::new(),
        }
    }

    /// Expand the whole circuit; any failing occurrence fails the expansion
    pub fn expand(&mut self, input: &[GateOccurrence]) -> Result<Circuit> {
        let mut circuit = Circuit::new();
        for occurrence in input {
            let expanded = self.expand_occurrence(occurrence)?;
            debug!("{} -> {} entries", occurrence, expanded.len());
            circuit.extend(expanded);
        }
        Ok(circuit)
    }

    fn expand_occurrence(&mut self, occurrence: &GateOccurrence) -> Result<Vec<GateEntry>> {
        let name = occurrence.name();

        if let Some(decomposition) = self.table.get(name) {
            return bind(name, decomposition, occurrence);
        }

        match occurrence {
            GateOccurrence::Parametrized(name, angle, qubit) => match name.as_str() {
                "Rx" => Ok(vec![GateEntry::Rotation { axis: Axis::X, angle: *angle, qubit: *qubit }]),
                "Rz" => Ok(vec![GateEntry::Rotation { axis: Axis::Z, angle: *angle, qubit: *qubit }]),
                "Ry" => {
                    let decomposition = self.ry_decomposition(*angle)?;
                    bind(name, &decomposition, occurrence)
                }
                _ => Err(CompileError::UnknownGate(name.clone())),
            },
            GateOccurrence::Controlled(name, control, target) if name == "CZ" => {
                if control == target {
                    return Err(CompileError::ArityMismatch {
                        name: name.clone(),
                        occurrence: occurrence.to_string(),
                    });
                }
                Ok(vec![GateEntry::Cz { control: *control, target: *target }])
            }
            _ => Err(CompileError::UnknownGate(name.to_string())),
        }
    }

    fn ry_decomposition(&mut self, angle: f64) -> Result<Vec<TemplateEntry>> {
        if let Some(cached) = self.rotation_cache.get(&angle.to_bits()) {
            return Ok(cached.clone());
        }

        let gate = ParametrizedGate::Ry(angle);
        let wrap = |source| CompileError::Synthesis { gate: gate.name(), source };
        let synthesis = self.synthesizer.synthesize(&gate.matrix()).map_err(wrap)?;
        let entries = synthesis.entries().map_err(wrap)?;
        debug!("{} -> {}", gate.name(), format_entries(&entries));

        self.rotation_cache.insert(angle.to_bits(), entries.clone());
        Ok(entries)
    }
}

/// Bind an unbound decomposition to the qubits of `occurrence`.
///
/// A two-qubit occurrence needs two distinct qubits and a decomposition that
/// contains a `Cz`; a single-qubit occurrence needs one without.
fn bind(name: &str, decomposition: &[TemplateEntry], occurrence: &GateOccurrence) -> Result<Vec<GateEntry>> {
    let mismatch = || CompileError::ArityMismatch {
        name: name.to_string(),
        occurrence: occurrence.to_string(),
    };

    match *occurrence {
        GateOccurrence::Controlled(_, control, target) => {
            let entangles = decomposition.iter().any(|entry| matches!(entry, TemplateEntry::Cz));
            if control == target || !entangles {
                return Err(mismatch());
            }
            Ok(decomposition
                .iter()
                .map(|entry| entry.bind_controlled(control, target))
                .collect())
        }
        GateOccurrence::Single(_, qubit) | GateOccurrence::Parametrized(_, _, qubit) => decomposition
            .iter()
            .map(|entry| entry.bind_single(qubit).ok_or_else(mismatch))
            .collect(),
    }
}

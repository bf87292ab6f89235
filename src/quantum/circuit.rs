use std::fmt;
use num_complex::Complex64;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::quantum::gate::{
    identity, tensor_to_full_system, ParametrizedGate, QuantumGate, StandardGate,
};

/// Rotation axes available in the target gate set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    /// Matrix of a rotation of `angle` about this axis
    pub fn rotation(self, angle: f64) -> Array2<Complex64> {
        match self {
            Axis::X => ParametrizedGate::Rx(angle).matrix(),
            Axis::Z => ParametrizedGate::Rz(angle).matrix(),
        }
    }

    fn label(self) -> &'static str {
        match self {
            Axis::X => "Rx",
            Axis::Z => "Rz",
        }
    }
}

/// A primitive gate bound to concrete qubits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GateEntry {
    /// Single-qubit rotation
    Rotation { axis: Axis, angle: f64, qubit: usize },

    /// Controlled-Z on an ordered qubit pair
    Cz { control: usize, target: usize },
}

impl GateEntry {
    pub fn rx(angle: f64, qubit: usize) -> Self {
        GateEntry::Rotation { axis: Axis::X, angle, qubit }
    }

    pub fn rz(angle: f64, qubit: usize) -> Self {
        GateEntry::Rotation { axis: Axis::Z, angle, qubit }
    }

    pub fn cz(control: usize, target: usize) -> Self {
        GateEntry::Cz { control, target }
    }

    /// Qubits this entry acts on, in the order of the gate's tensor factors
    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            GateEntry::Rotation { qubit, .. } => vec![qubit],
            GateEntry::Cz { control, target } => vec![control, target],
        }
    }

    /// Matrix of the entry on its own qubits
    pub fn matrix(&self) -> Array2<Complex64> {
        match *self {
            GateEntry::Rotation { axis, angle, .. } => axis.rotation(angle),
            GateEntry::Cz { .. } => StandardGate::CZ.matrix(),
        }
    }
}

impl fmt::Display for GateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GateEntry::Rotation { axis, angle, qubit } => {
                write!(f, "{}({:.2}) q{}", axis.label(), angle, qubit)
            }
            GateEntry::Cz { control, target } => write!(f, "CZ q{} q{}", control, target),
        }
    }
}

/// A primitive gate of a decomposition, not yet bound to qubits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TemplateEntry {
    Rotation { axis: Axis, angle: f64 },
    Cz,
}

impl TemplateEntry {
    pub fn rx(angle: f64) -> Self {
        TemplateEntry::Rotation { axis: Axis::X, angle }
    }

    pub fn rz(angle: f64) -> Self {
        TemplateEntry::Rotation { axis: Axis::Z, angle }
    }

    /// Binds a single-qubit decomposition: every rotation lands on `qubit`.
    ///
    /// Returns `None` for `Cz`, which needs two qubits.
    pub fn bind_single(&self, qubit: usize) -> Option<GateEntry> {
        match *self {
            TemplateEntry::Rotation { axis, angle } => Some(GateEntry::Rotation { axis, angle, qubit }),
            TemplateEntry::Cz => None,
        }
    }

    /// Binds a two-qubit decomposition: `Cz` takes both qubits, rotations take the target.
    pub fn bind_controlled(&self, control: usize, target: usize) -> GateEntry {
        match *self {
            TemplateEntry::Rotation { axis, angle } => GateEntry::Rotation { axis, angle, qubit: target },
            TemplateEntry::Cz => GateEntry::Cz { control, target },
        }
    }
}

impl fmt::Display for TemplateEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            TemplateEntry::Rotation { axis, angle } => write!(f, "{}({:.2})", axis.label(), angle),
            TemplateEntry::Cz => write!(f, "CZ"),
        }
    }
}

/// An element of an input circuit: a named source gate and the qubits it acts on.
///
/// Serialized as a JSON tuple: `["H", 0]`, `["Rx", 3.14, 0]`, `["CNOT", 1, 0]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GateOccurrence {
    /// Fixed single-qubit gate
    Single(String, usize),

    /// Two-qubit gate on (control, target)
    Controlled(String, usize, usize),

    /// Single-qubit rotation with an explicit angle
    Parametrized(String, f64, usize),
}

impl GateOccurrence {
    pub fn name(&self) -> &str {
        match self {
            GateOccurrence::Single(name, _) |
            GateOccurrence::Controlled(name, _, _) |
            GateOccurrence::Parametrized(name, _, _) => name,
        }
    }

    pub fn qubits(&self) -> Vec<usize> {
        match *self {
            GateOccurrence::Single(_, q) | GateOccurrence::Parametrized(_, _, q) => vec![q],
            GateOccurrence::Controlled(_, c, t) => vec![c, t],
        }
    }

    /// Closed-form matrix of the named source gate, if it is one this crate knows
    pub fn matrix(&self) -> Option<Array2<Complex64>> {
        match self {
            GateOccurrence::Single(name, _) => StandardGate::from_name(name)
                .filter(|g| g.qubit_count() == 1)
                .map(|g| g.matrix()),
            GateOccurrence::Controlled(name, _, _) => StandardGate::from_name(name)
                .filter(|g| g.qubit_count() == 2)
                .map(|g| g.matrix()),
            GateOccurrence::Parametrized(name, angle, _) => match name.as_str() {
                "Rx" => Some(ParametrizedGate::Rx(*angle).matrix()),
                "Ry" => Some(ParametrizedGate::Ry(*angle).matrix()),
                "Rz" => Some(ParametrizedGate::Rz(*angle).matrix()),
                _ => None,
            },
        }
    }
}

/// Unitary of an input circuit on a `qubit_count`-qubit register, qubit 0 most significant.
///
/// Returns `None` for unknown gates or out-of-range qubits.
pub fn source_unitary(input: &[GateOccurrence], qubit_count: usize) -> Option<Array2<Complex64>> {
    let mut result = identity(qubit_count);
    for occurrence in input {
        let qubits = occurrence.qubits();
        if qubits.iter().any(|&q| q >= qubit_count) {
            return None;
        }
        let full = tensor_to_full_system(&occurrence.matrix()?, qubit_count, &qubits);
        result = full.dot(&result);
    }
    Some(result)
}

impl fmt::Display for GateOccurrence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GateOccurrence::Single(name, q) => write!(f, "{} q{}", name, q),
            GateOccurrence::Controlled(name, c, t) => write!(f, "{} q{} q{}", name, c, t),
            GateOccurrence::Parametrized(name, angle, q) => write!(f, "{}({:.2}) q{}", name, angle, q),
        }
    }
}

/// A circuit over the {Rx, Rz, CZ} gate set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Circuit {
    pub entries: Vec<GateEntry>,
}

impl Circuit {
    /// Create a new empty circuit
    pub fn new() -> Self {
        Circuit { entries: Vec::new() }
    }

    pub fn from_entries(entries: Vec<GateEntry>) -> Self {
        Circuit { entries }
    }

    pub fn push(&mut self, entry: GateEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, GateEntry> {
        self.entries.iter()
    }

    /// Number of qubits the circuit touches (highest index + 1)
    pub fn qubit_count(&self) -> usize {
        self.entries
            .iter()
            .flat_map(|e| e.qubits())
            .max()
            .map_or(0, |q| q + 1)
    }

    /// Unitary of the whole circuit on a `qubit_count`-qubit register, qubit 0 most significant.
    ///
    /// Returns `None` when an entry references a qubit outside the register.
    pub fn unitary(&self, qubit_count: usize) -> Option<Array2<Complex64>> {
        let mut result = identity(qubit_count);
        for entry in &self.entries {
            let qubits = entry.qubits();
            if qubits.iter().any(|&q| q >= qubit_count) {
                return None;
            }
            let full = tensor_to_full_system(&entry.matrix(), qubit_count, &qubits);
            result = full.dot(&result);
        }
        Some(result)
    }
}

impl FromIterator<GateEntry> for Circuit {
    fn from_iter<T: IntoIterator<Item = GateEntry>>(iter: T) -> Self {
        Circuit { entries: iter.into_iter().collect() }
    }
}

impl Extend<GateEntry> for Circuit {
    fn extend<T: IntoIterator<Item = GateEntry>>(&mut self, iter: T) {
        self.entries.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Circuit {
    type Item = &'a GateEntry;
    type IntoIter = std::slice::Iter<'a, GateEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}

/// Checks `a == e^{iφ} b` for some global phase φ, entry-wise within `tolerance`
pub fn equivalent_up_to_phase(a: &Array2<Complex64>, b: &Array2<Complex64>, tolerance: f64) -> bool {
    if a.dim() != b.dim() {
        return false;
    }

    // Fix the phase on the largest entry of b
    let pivot = b
        .iter()
        .zip(a.iter())
        .max_by(|x, y| x.0.norm().total_cmp(&y.0.norm()));

    let phase = match pivot {
        Some((bv, av)) if bv.norm() > tolerance => {
            let ratio = av / bv;
            if ratio.norm() < f64::EPSILON {
                return false;
            }
            ratio / ratio.norm()
        }
        _ => return a.iter().all(|v| v.norm() <= tolerance),
    };

    a.iter()
        .zip(b.iter())
        .all(|(av, bv)| (av - phase * bv).norm() <= tolerance)
}

/// A builder for input circuits
#[derive(Debug, Clone, Default)]
pub struct CircuitBuilder {
    occurrences: Vec<GateOccurrence>,
}

impl CircuitBuilder {
    /// Create a new circuit builder
    pub fn new() -> Self {
        CircuitBuilder::default()
    }

    /// Build the input circuit
    pub fn build(self) -> Vec<GateOccurrence> {
        self.occurrences
    }

    fn single(mut self, gate: StandardGate, qubit: usize) -> Self {
        self.occurrences.push(GateOccurrence::Single(gate.name(), qubit));
        self
    }

    fn parametrized(mut self, name: &str, angle: f64, qubit: usize) -> Self {
        self.occurrences.push(GateOccurrence::Parametrized(name.to_string(), angle, qubit));
        self
    }

    /// Add an identity gate
    pub fn i(self, qubit: usize) -> Self {
        self.single(StandardGate::I, qubit)
    }

    /// Add a Hadamard gate
    pub fn h(self, qubit: usize) -> Self {
        self.single(StandardGate::H, qubit)
    }

    /// Add a Pauli-X gate
    pub fn x(self, qubit: usize) -> Self {
        self.single(StandardGate::X, qubit)
    }

    /// Add a Pauli-Y gate
    pub fn y(self, qubit: usize) -> Self {
        self.single(StandardGate::Y, qubit)
    }

    /// Add a Pauli-Z gate
    pub fn z(self, qubit: usize) -> Self {
        self.single(StandardGate::Z, qubit)
    }

    /// Add an Rx gate
    pub fn rx(self, theta: f64, qubit: usize) -> Self {
        self.parametrized("Rx", theta, qubit)
    }

    /// Add an Ry gate
    pub fn ry(self, theta: f64, qubit: usize) -> Self {
        self.parametrized("Ry", theta, qubit)
    }

    /// Add an Rz gate
    pub fn rz(self, theta: f64, qubit: usize) -> Self {
        self.parametrized("Rz", theta, qubit)
    }

    /// Add a CZ gate
    pub fn cz(mut self, control: usize, target: usize) -> Self {
        self.occurrences.push(GateOccurrence::Controlled(StandardGate::CZ.name(), control, target));
        self
    }

    /// Add a CNOT gate
    pub fn cnot(mut self, control: usize, target: usize) -> Self {
        self.occurrences.push(GateOccurrence::Controlled(StandardGate::CNOT.name(), control, target));
        self
    }

    /// Add an arbitrary occurrence
    pub fn occurrence(mut self, occurrence: GateOccurrence) -> Self {
        self.occurrences.push(occurrence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_occurrence_json_shapes() {
        let input = r#"[["H", 0], ["Rx", 3.14, 0], ["CNOT", 1, 0]]"#;
        let parsed: Vec<GateOccurrence> = serde_json::from_str(input).unwrap();
        assert_eq!(parsed[0], GateOccurrence::Single("H".into(), 0));
        assert_eq!(parsed[1], GateOccurrence::Parametrized("Rx".into(), crate::synthesis::round2(std::f64::consts::PI), 0));
        assert_eq!(parsed[2], GateOccurrence::Controlled("CNOT".into(), 1, 0));
    }

    #[test]
    fn test_equivalent_up_to_phase() {
        let z = StandardGate::Z.matrix();
        let rz = ParametrizedGate::Rz(std::f64::consts::PI).matrix();
        assert!(equivalent_up_to_phase(&z, &rz, 1e-9));
        assert!(!equivalent_up_to_phase(&z, &StandardGate::X.matrix(), 1e-9));
    }

    #[test]
    fn test_hzh_unitary_is_x() {
        let h = StandardGate::H.matrix();
        let circuit = Circuit::from_entries(vec![GateEntry::rz(std::f64::consts::PI, 0)]);
        let z = circuit.unitary(1).unwrap();
        let hzh = h.dot(&z).dot(&h);
        assert!(equivalent_up_to_phase(&hzh, &StandardGate::X.matrix(), 1e-9));
    }
}

// src/quantum/gate.rs
//! Quantum gates implementation
//!
//! This module defines the closed-form matrices of the named source gates and
//! the rotation generators the synthesizer builds its templates from.

use std::fmt::Debug;
use num_complex::Complex64;
use ndarray::{array, Array1, Array2};

/// Common complex numbers used in quantum gates
pub mod constants {
    use num_complex::Complex64;

    /// The imaginary unit i
    pub const I: Complex64 = Complex64::new(0.0, 1.0);

    /// Complex zero
    pub const ZERO: Complex64 = Complex64::new(0.0, 0.0);

    /// Complex one
    pub const ONE: Complex64 = Complex64::new(1.0, 0.0);

    /// 1/sqrt(2)
    pub const FRAC_1_SQRT_2: f64 = std::f64::consts::FRAC_1_SQRT_2;
}

/// Trait for quantum gates with a fixed matrix representation
pub trait QuantumGate: Debug + Send + Sync {
    /// Returns the number of qubits this gate acts on
    fn qubit_count(&self) -> usize;

    /// Returns the matrix representation of this gate
    fn matrix(&self) -> Array2<Complex64>;

    /// Returns a display name for this gate
    fn name(&self) -> String;
}

/// Standard quantum gates (Pauli, Hadamard, etc.)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StandardGate {
    /// Single-qubit identity gate
    I,

    /// Pauli-X gate (NOT gate)
    X,

    /// Pauli-Y gate
    Y,

    /// Pauli-Z gate
    Z,

    /// Hadamard gate
    H,

    /// CNOT gate
    CNOT,

    /// Controlled-Z gate
    CZ,
}

impl StandardGate {
    /// Every fixed gate with a known closed form
    pub const ALL: [StandardGate; 7] = [
        StandardGate::I,
        StandardGate::H,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
        StandardGate::CNOT,
        StandardGate::CZ,
    ];

    /// The single-qubit gates a default decomposition table is synthesized for
    pub const SINGLE_QUBIT: [StandardGate; 5] = [
        StandardGate::I,
        StandardGate::H,
        StandardGate::X,
        StandardGate::Y,
        StandardGate::Z,
    ];

    /// Looks a gate up by the name used in input circuits
    pub fn from_name(name: &str) -> Option<StandardGate> {
        StandardGate::ALL.into_iter().find(|g| g.name() == name)
    }
}

impl QuantumGate for StandardGate {
    fn qubit_count(&self) -> usize {
        match self {
            StandardGate::I | StandardGate::X | StandardGate::Y |
            StandardGate::Z | StandardGate::H => 1,
            StandardGate::CNOT | StandardGate::CZ => 2,
        }
    }

    fn matrix(&self) -> Array2<Complex64> {
        use constants::*;
        match self {
            StandardGate::I => identity(1),
            StandardGate::X => {
                array![
                    [ZERO, ONE],
                    [ONE, ZERO]
                ]
            },
            StandardGate::Y => {
                array![
                    [ZERO, -I],
                    [I, ZERO]
                ]
            },
            StandardGate::Z => {
                array![
                    [ONE, ZERO],
                    [ZERO, -ONE]
                ]
            },
            StandardGate::H => {
                let factor = Complex64::new(FRAC_1_SQRT_2, 0.0);
                array![
                    [factor, factor],
                    [factor, -factor]
                ]
            },
            StandardGate::CNOT => {
                array![
                    [ONE, ZERO, ZERO, ZERO],
                    [ZERO, ONE, ZERO, ZERO],
                    [ZERO, ZERO, ZERO, ONE],
                    [ZERO, ZERO, ONE, ZERO]
                ]
            },
            StandardGate::CZ => {
                array![
                    [ONE, ZERO, ZERO, ZERO],
                    [ZERO, ONE, ZERO, ZERO],
                    [ZERO, ZERO, ONE, ZERO],
                    [ZERO, ZERO, ZERO, -ONE]
                ]
            },
        }
    }

    fn name(&self) -> String {
        match self {
            StandardGate::I => "I".to_string(),
            StandardGate::X => "X".to_string(),
            StandardGate::Y => "Y".to_string(),
            StandardGate::Z => "Z".to_string(),
            StandardGate::H => "H".to_string(),
            StandardGate::CNOT => "CNOT".to_string(),
            StandardGate::CZ => "CZ".to_string(),
        }
    }
}

/// Parametrized single-qubit rotations
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ParametrizedGate {
    /// Rotation around X-axis
    Rx(f64),

    /// Rotation around Y-axis
    Ry(f64),

    /// Rotation around Z-axis
    Rz(f64),
}

impl QuantumGate for ParametrizedGate {
    fn qubit_count(&self) -> usize {
        1
    }

    fn matrix(&self) -> Array2<Complex64> {
        match *self {
            ParametrizedGate::Rx(theta) => {
                let cos = (theta / 2.0).cos();
                let sin = (theta / 2.0).sin();
                array![
                    [Complex64::new(cos, 0.0), Complex64::new(0.0, -sin)],
                    [Complex64::new(0.0, -sin), Complex64::new(cos, 0.0)]
                ]
            },
            ParametrizedGate::Ry(theta) => {
                let cos = (theta / 2.0).cos();
                let sin = (theta / 2.0).sin();
                array![
                    [Complex64::new(cos, 0.0), Complex64::new(-sin, 0.0)],
                    [Complex64::new(sin, 0.0), Complex64::new(cos, 0.0)]
                ]
            },
            ParametrizedGate::Rz(theta) => {
                let phase_pos = Complex64::new(0.0, theta / 2.0).exp();
                let phase_neg = Complex64::new(0.0, -theta / 2.0).exp();
                array![
                    [phase_neg, constants::ZERO],
                    [constants::ZERO, phase_pos]
                ]
            },
        }
    }

    fn name(&self) -> String {
        match self {
            ParametrizedGate::Rx(theta) => format!("Rx({:.2})", theta),
            ParametrizedGate::Ry(theta) => format!("Ry({:.2})", theta),
            ParametrizedGate::Rz(theta) => format!("Rz({:.2})", theta),
        }
    }
}

/// Identity matrix on `qubits` qubits
pub fn identity(qubits: usize) -> Array2<Complex64> {
    let dim = 1 << qubits;
    Array2::from_diag(&Array1::from_elem(dim, constants::ONE))
}

/// Kronecker product `a ⊗ b`
pub fn kron(a: &Array2<Complex64>, b: &Array2<Complex64>) -> Array2<Complex64> {
    let (ar, ac) = a.dim();
    let (br, bc) = b.dim();
    let mut result = Array2::zeros((ar * br, ac * bc));

    for i in 0..ar {
        for j in 0..ac {
            let scale = a[[i, j]];
            for k in 0..br {
                for l in 0..bc {
                    result[[i * br + k, j * bc + l]] = scale * b[[k, l]];
                }
            }
        }
    }

    result
}

/// Lifts a single-qubit matrix onto the second factor of a two-qubit register: `I ⊗ m`
pub fn lift(m: &Array2<Complex64>) -> Array2<Complex64> {
    kron(&identity(1), m)
}

/// Expands a gate matrix acting on `target_qubits` to the full `total_qubits` register.
///
/// Qubit 0 is the most significant bit. The order of `target_qubits` is the order of
/// the gate's own tensor factors, so `[1, 0]` applies a controlled gate with qubit 1
/// as its control.
pub fn tensor_to_full_system(
    gate_matrix: &Array2<Complex64>,
    total_qubits: usize,
    target_qubits: &[usize],
) -> Array2<Complex64> {
    let dim = 1 << total_qubits;
    let mut result = Array2::zeros((dim, dim));
    let num_target = target_qubits.len();

    for i in 0..dim {
        for j in 0..dim {
            // Non-target bits must match
            let matches = (0..total_qubits)
                .filter(|q| !target_qubits.contains(q))
                .all(|q| {
                    let shift = total_qubits - 1 - q;
                    (i >> shift) & 1 == (j >> shift) & 1
                });

            if !matches {
                continue;
            }

            let mut sub_i = 0;
            let mut sub_j = 0;
            for (k, &q) in target_qubits.iter().enumerate() {
                let shift_full = total_qubits - 1 - q;
                sub_i |= ((i >> shift_full) & 1) << ((num_target - 1) - k);
                sub_j |= ((j >> shift_full) & 1) << ((num_target - 1) - k);
            }

            result[[i, j]] = gate_matrix[[sub_i, sub_j]];
        }
    }

    result
}

/// Renders a matrix with two decimals per component, one row per line
pub fn format_matrix(m: &Array2<Complex64>) -> String {
    m.rows()
        .into_iter()
        .map(|row| {
            row.iter()
                .map(|c| format!("{:>7.2}{:+.2}i", c.re, c.im))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lift_places_matrix_on_second_factor() {
        let x = StandardGate::X.matrix();
        let lifted = lift(&x);
        assert_eq!(lifted[[0, 1]], constants::ONE);
        assert_eq!(lifted[[2, 3]], constants::ONE);
        assert_eq!(lifted[[0, 2]], constants::ZERO);
    }

    #[test]
    fn test_cnot_with_reversed_qubits() {
        // Control on qubit 1, target on qubit 0
        let full = tensor_to_full_system(&StandardGate::CNOT.matrix(), 2, &[1, 0]);
        // |01> (q0=0, q1=1) maps to |11>
        assert_eq!(full[[3, 1]], constants::ONE);
        assert_eq!(full[[1, 3]], constants::ONE);
        assert_eq!(full[[0, 0]], constants::ONE);
        assert_eq!(full[[2, 2]], constants::ONE);
    }

    #[test]
    fn test_from_name() {
        assert_eq!(StandardGate::from_name("CNOT"), Some(StandardGate::CNOT));
        assert_eq!(StandardGate::from_name("H"), Some(StandardGate::H));
        assert_eq!(StandardGate::from_name("T"), None);
    }
}

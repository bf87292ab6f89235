//! Parametrized {Rx, Rz, CZ} circuit templates
//!
//! Angle `x[0]` of every template is a global phase exponent and never becomes
//! a gate. The remaining angles feed Rz/Rx/Rz runs, in circuit order.

use num_complex::Complex64;
use ndarray::Array2;

use crate::quantum::circuit::{Axis, TemplateEntry};
use crate::quantum::gate::{lift, QuantumGate, StandardGate};
use super::{Result, SynthesisError};

/// Number of qubits a template acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateShape {
    OneQubit,
    TwoQubit,
}

impl TemplateShape {
    /// Shape matching a square target matrix
    pub fn for_matrix(m: &Array2<Complex64>) -> Result<TemplateShape> {
        match m.dim() {
            (2, 2) => Ok(TemplateShape::OneQubit),
            (4, 4) => Ok(TemplateShape::TwoQubit),
            (rows, cols) => Err(SynthesisError::InvalidTarget { rows, cols }),
        }
    }
}

/// Axis of the `k`-th rotation in a Rz, Rx, Rz run
fn run_axis(k: usize) -> Axis {
    if k % 2 == 0 { Axis::Z } else { Axis::X }
}

/// Length of the angle vector for a template of the given shape and depth
pub fn parameter_count(shape: TemplateShape, depth: usize) -> usize {
    match shape {
        TemplateShape::OneQubit => depth + 1,
        TemplateShape::TwoQubit => 2 * depth + 1,
    }
}

fn check(shape: TemplateShape, depth: usize, x: &[f64]) -> Result<()> {
    if !(1..=3).contains(&depth) {
        return Err(SynthesisError::InvalidDepth(depth));
    }
    let expected = parameter_count(shape, depth);
    if x.len() != expected {
        return Err(SynthesisError::ParameterCount { expected, actual: x.len() });
    }
    Ok(())
}

/// Product of a run of rotations applied in order (first angle acts first)
fn rotation_run(angles: &[f64]) -> Array2<Complex64> {
    let mut result = StandardGate::I.matrix();
    for (k, &angle) in angles.iter().enumerate() {
        result = run_axis(k).rotation(angle).dot(&result);
    }
    result
}

/// Unitary of the template of `shape` at `depth`, instantiated with angles `x`
pub fn template_unitary(shape: TemplateShape, depth: usize, x: &[f64]) -> Result<Array2<Complex64>> {
    check(shape, depth, x)?;
    let phase = Complex64::new(0.0, x[0]).exp();

    let unitary = match shape {
        TemplateShape::OneQubit => rotation_run(&x[1..]),
        TemplateShape::TwoQubit => {
            let before = lift(&rotation_run(&x[1..=depth]));
            let after = lift(&rotation_run(&x[depth + 1..]));
            after.dot(&StandardGate::CZ.matrix()).dot(&before)
        }
    };

    Ok(unitary.mapv(|v| v * phase))
}

/// Gate sequence of an accepted angle vector; its length selects the template.
///
/// The global phase `x[0]` is dropped.
pub fn entries_from_angles(shape: TemplateShape, x: &[f64]) -> Result<Vec<TemplateEntry>> {
    let depth = match (shape, x.len()) {
        (TemplateShape::OneQubit, n @ 2..=4) => n - 1,
        (TemplateShape::TwoQubit, n @ (3 | 5 | 7)) => (n - 1) / 2,
        (_, n) => return Err(SynthesisError::UnsupportedAngleCount(n)),
    };

    let run = |angles: &[f64]| -> Vec<TemplateEntry> {
        angles
            .iter()
            .enumerate()
            .map(|(k, &angle)| TemplateEntry::Rotation { axis: run_axis(k), angle })
            .collect()
    };

    let entries = match shape {
        TemplateShape::OneQubit => run(&x[1..]),
        TemplateShape::TwoQubit => {
            let mut entries = run(&x[1..=depth]);
            entries.push(TemplateEntry::Cz);
            entries.extend(run(&x[depth + 1..]));
            entries
        }
    };

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::circuit::{equivalent_up_to_phase, Circuit};
    use crate::quantum::gate::ParametrizedGate;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_parameter_counts() {
        assert_eq!(parameter_count(TemplateShape::OneQubit, 1), 2);
        assert_eq!(parameter_count(TemplateShape::OneQubit, 3), 4);
        assert_eq!(parameter_count(TemplateShape::TwoQubit, 1), 3);
        assert_eq!(parameter_count(TemplateShape::TwoQubit, 3), 7);
    }

    #[test]
    fn test_wrong_length_rejected() {
        let err = template_unitary(TemplateShape::TwoQubit, 2, &[0.0; 4]).unwrap_err();
        assert_eq!(err, SynthesisError::ParameterCount { expected: 5, actual: 4 });
        assert_eq!(
            template_unitary(TemplateShape::OneQubit, 4, &[0.0; 5]).unwrap_err(),
            SynthesisError::InvalidDepth(4)
        );
    }

    #[test]
    fn test_one_qubit_depth_two_order() {
        // Rz acts first, then Rx
        let x = [0.3, 0.7, 1.1];
        let u = template_unitary(TemplateShape::OneQubit, 2, &x).unwrap();
        let expected = ParametrizedGate::Rx(1.1).matrix().dot(&ParametrizedGate::Rz(0.7).matrix());
        assert!(equivalent_up_to_phase(&u, &expected, 1e-12));
    }

    #[test]
    fn test_hand_supplied_cnot_fits_depth_three() {
        let x = [0.0, FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, FRAC_PI_2, FRAC_PI_2];
        let u = template_unitary(TemplateShape::TwoQubit, 3, &x).unwrap();
        assert!(equivalent_up_to_phase(&u, &StandardGate::CNOT.matrix(), 1e-9));
    }

    #[test]
    fn test_depth_three_mapping_recomposes_template() {
        // Distinct angles expose any index mix-up in the last rotation
        let x = [0.0, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6];
        let entries = entries_from_angles(TemplateShape::TwoQubit, &x).unwrap();
        assert_eq!(entries.len(), 7);
        assert_eq!(entries[3], TemplateEntry::Cz);
        assert_eq!(entries[6], TemplateEntry::rz(0.6));

        let circuit: Circuit = entries.iter().map(|e| e.bind_controlled(0, 1)).collect();
        let u = circuit.unitary(2).unwrap();
        let template = template_unitary(TemplateShape::TwoQubit, 3, &x).unwrap();
        assert!(equivalent_up_to_phase(&u, &template, 1e-9));
    }

    #[test]
    fn test_one_qubit_mappings() {
        assert_eq!(
            entries_from_angles(TemplateShape::OneQubit, &[0.5, 3.0]).unwrap(),
            vec![TemplateEntry::rz(3.0)]
        );
        assert_eq!(
            entries_from_angles(TemplateShape::OneQubit, &[0.5, 1.0, 2.0, 3.0]).unwrap(),
            vec![TemplateEntry::rz(1.0), TemplateEntry::rx(2.0), TemplateEntry::rz(3.0)]
        );
        assert!(entries_from_angles(TemplateShape::TwoQubit, &[0.0; 4]).is_err());
    }
}

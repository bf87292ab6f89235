use num_complex::Complex64;
use ndarray::Array2;

use super::template::{parameter_count, template_unitary, TemplateShape};
use super::{Result, SynthesisError};

/// Magnitude below which a target entry counts as a structural zero
pub const STRUCTURAL_ZERO: f64 = 1e-12;

/// Masked squared distance between a target matrix and a template instantiation.
///
/// Only positions where the target is nonzero contribute; the template may hold
/// anything where the target is zero.
#[derive(Debug, Clone)]
pub struct FitObjective {
    target: Array2<Complex64>,
    mask: Array2<bool>,
    shape: TemplateShape,
    depth: usize,
}

impl FitObjective {
    pub fn new(target: &Array2<Complex64>, depth: usize) -> Result<Self> {
        let shape = TemplateShape::for_matrix(target)?;
        if !(1..=3).contains(&depth) {
            return Err(SynthesisError::InvalidDepth(depth));
        }
        Ok(FitObjective {
            target: target.clone(),
            mask: target.mapv(|v| v.norm() > STRUCTURAL_ZERO),
            shape,
            depth,
        })
    }

    pub fn shape(&self) -> TemplateShape {
        self.shape
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Length of the angle vectors this objective accepts
    pub fn dimension(&self) -> usize {
        parameter_count(self.shape, self.depth)
    }

    /// Residual at angle vector `x`
    pub fn evaluate(&self, x: &[f64]) -> Result<f64> {
        let u = template_unitary(self.shape, self.depth, x)?;
        Ok(self.residual(&u))
    }

    /// Residual of an already instantiated template matrix
    pub fn residual(&self, u: &Array2<Complex64>) -> f64 {
        self.target
            .iter()
            .zip(u.iter())
            .zip(self.mask.iter())
            .filter(|(_, nonzero)| **nonzero)
            .map(|((m, v), _)| (m - v).norm_sqr())
            .sum()
    }

    /// Objective as a plain closure for the minimizers; wrong-length input scores infinity
    pub fn as_fn(&self) -> impl Fn(&[f64]) -> f64 + '_ {
        move |x: &[f64]| self.evaluate(x).unwrap_or(f64::INFINITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantum::gate::{QuantumGate, StandardGate};
    use approx::assert_abs_diff_eq;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_zero_at_exact_fit() {
        // Z = e^{iπ/2} Rz(π)
        let objective = FitObjective::new(&StandardGate::Z.matrix(), 1).unwrap();
        assert_abs_diff_eq!(objective.evaluate(&[FRAC_PI_2, PI]).unwrap(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_mask_ignores_structural_zeros() {
        // The identity mask only sees the diagonal, so an Rx-free template fits
        let objective = FitObjective::new(&StandardGate::I.matrix(), 1).unwrap();
        assert_abs_diff_eq!(objective.evaluate(&[0.0, 0.0]).unwrap(), 0.0, epsilon = 1e-12);

        // Off-diagonal garbage is not penalized
        let x = StandardGate::X.matrix();
        let objective = FitObjective::new(&x, 2).unwrap();
        let mut garbage = x.clone();
        garbage[[0, 0]] = Complex64::new(5.0, 5.0);
        assert_abs_diff_eq!(objective.residual(&garbage), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_positive_away_from_fit() {
        let objective = FitObjective::new(&StandardGate::Z.matrix(), 1).unwrap();
        // Rz(0) with no phase: |1-1|^2 + |-1-1|^2 = 4
        assert_abs_diff_eq!(objective.evaluate(&[0.0, 0.0]).unwrap(), 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        let m = Array2::<Complex64>::zeros((3, 3));
        assert!(matches!(FitObjective::new(&m, 1), Err(SynthesisError::InvalidTarget { .. })));
        let objective = FitObjective::new(&StandardGate::H.matrix(), 2).unwrap();
        assert_eq!(objective.dimension(), 3);
        assert!(objective.as_fn()(&[0.0]).is_infinite());
    }
}

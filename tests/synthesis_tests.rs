use num_complex::Complex64;
use ndarray::Array2;
use rzxcz::compiler::CircuitReducer;
use rzxcz::quantum::{equivalent_up_to_phase, Circuit, GateEntry, QuantumGate, StandardGate, TemplateEntry};
use rzxcz::synthesis::*;

#[cfg(test)]
mod synthesis_tests {
    use super::*;
    use std::f64::consts::PI;

    #[derive(Debug)]
    struct NeverConverges;

    impl BoundedMinimizer for NeverConverges {
        fn name(&self) -> &'static str {
            "never"
        }

        fn minimize(&self, _f: &dyn Fn(&[f64]) -> f64, x0: &[f64], _bounds: &[Bounds]) -> MinimizeResult {
            MinimizeResult {
                x: x0.to_vec(),
                fun: 1.0,
                success: false,
                iterations: 0,
                message: "gave up",
            }
        }
    }

    fn bind_to_qubit(entries: &[TemplateEntry], qubit: usize) -> Circuit {
        entries.iter().filter_map(|e| e.bind_single(qubit)).collect()
    }

    #[test]
    fn test_single_qubit_gates_synthesize() {
        for gate in StandardGate::SINGLE_QUBIT {
            let mut synthesizer = Synthesizer::new(config_from_seed(1));
            let synthesis = synthesizer.synthesize(&gate.matrix()).unwrap();

            assert_eq!(synthesis.shape, TemplateShape::OneQubit);
            assert!(synthesis.residual < 0.01, "{}: residual {}", gate.name(), synthesis.residual);
            assert!(synthesis.angles.iter().all(|&a| a == round2(a)));

            let unitary = synthesis.unitary().unwrap();
            assert!(equivalent_up_to_phase(&unitary, &gate.matrix(), 0.05), "{} mismatch", gate.name());
        }
    }

    #[test]
    fn test_identity_reduces_to_nothing() {
        let mut synthesizer = Synthesizer::new(config_from_seed(3));
        let synthesis = synthesizer.synthesize(&StandardGate::I.matrix()).unwrap();
        let circuit = bind_to_qubit(&synthesis.entries().unwrap(), 0);
        assert!(CircuitReducer::default().reduce(&circuit).is_empty());
    }

    #[test]
    fn test_phase_shifted_target_gives_equivalent_circuit() {
        let h = StandardGate::H.matrix();
        let phase = Complex64::from_polar(1.0, 0.7);
        let shifted: Array2<Complex64> = h.mapv(|v| v * phase);

        let mut synthesizer = Synthesizer::new(config_from_seed(5));
        let plain = synthesizer.synthesize(&h).unwrap();
        let rotated = synthesizer.synthesize(&shifted).unwrap();

        let reducer = CircuitReducer::default();
        let a = reducer.reduce(&bind_to_qubit(&plain.entries().unwrap(), 0));
        let b = reducer.reduce(&bind_to_qubit(&rotated.entries().unwrap(), 0));
        assert!(equivalent_up_to_phase(&a.unitary(1).unwrap(), &b.unitary(1).unwrap(), 0.05));
    }

    #[test]
    fn test_phase_shifted_z_gives_same_circuit() {
        let z = StandardGate::Z.matrix();
        let shifted: Array2<Complex64> = z.mapv(|v| v * Complex64::from_polar(1.0, 2.1));

        let mut synthesizer = Synthesizer::new(config_from_seed(8));
        let reducer = CircuitReducer::default();
        let a = reducer.reduce(&bind_to_qubit(&synthesizer.synthesize(&z).unwrap().entries().unwrap(), 0));
        let b = reducer.reduce(&bind_to_qubit(&synthesizer.synthesize(&shifted).unwrap().entries().unwrap(), 0));
        assert_eq!(a, b);
        assert_eq!(a.entries, vec![GateEntry::rz(round2(PI), 0)]);
    }

    #[test]
    fn test_same_seed_same_result() {
        let target = rzxcz::quantum::ParametrizedGate::Ry(PI / 3.0).matrix();
        let first = Synthesizer::new(config_from_seed(11)).synthesize(&target).unwrap();
        let second = Synthesizer::new(config_from_seed(11)).synthesize(&target).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_nonconvergence_escalates_then_exhausts() {
        let config = SynthesisConfig {
            max_attempts: 2,
            max_restarts: 3,
            ..config_from_seed(1)
        };
        let mut synthesizer = Synthesizer::with_minimizers(config, Box::new(NeverConverges), Box::new(NeverConverges));
        assert_eq!(
            synthesizer.synthesize(&StandardGate::X.matrix()),
            Err(SynthesisError::Exhausted { attempts: 2 })
        );
    }

    #[test]
    fn test_invalid_target_is_rejected() {
        let mut synthesizer = Synthesizer::new(SynthesisConfig::default());
        let target = Array2::<Complex64>::eye(3);
        assert_eq!(
            synthesizer.synthesize(&target),
            Err(SynthesisError::InvalidTarget { rows: 3, cols: 3 })
        );
    }

    #[test]
    fn test_two_qubit_cz_fits() {
        let mut synthesizer = Synthesizer::new(config_from_seed(2));
        let synthesis = synthesizer.synthesize(&StandardGate::CZ.matrix()).unwrap();
        assert_eq!(synthesis.shape, TemplateShape::TwoQubit);

        let circuit: Circuit = synthesis
            .entries()
            .unwrap()
            .iter()
            .map(|e| e.bind_controlled(0, 1))
            .collect();
        assert!(circuit.iter().any(|e| matches!(e, GateEntry::Cz { .. })));
        assert!(equivalent_up_to_phase(&circuit.unitary(2).unwrap(), &StandardGate::CZ.matrix(), 0.05));
    }
}

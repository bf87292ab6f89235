use rand::{rngs::StdRng, SeedableRng};

/// Tuning for the depth-escalating search
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisConfig {
    pub seed: u64,
    /// Deepest template tried before an outer restart
    pub max_depth: usize,
    /// Outer restarts from depth 1 before giving up
    pub max_attempts: usize,
    /// Fresh random starts per depth while the optimizer fails to converge
    pub max_restarts: usize,
    /// Projected-gradient stopping tolerance of the quasi-Newton minimizer
    pub gradient_tolerance: f64,
    /// Function-spread stopping tolerance of the simplex minimizer
    pub simplex_tolerance: f64,
    pub max_iterations: usize,
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        SynthesisConfig {
            seed: 1,
            max_depth: 3,
            max_attempts: 10,
            max_restarts: 50,
            gradient_tolerance: 1e-6,
            simplex_tolerance: 1e-8,
            max_iterations: 2000,
        }
    }
}

impl SynthesisConfig {
    pub fn rng(&self) -> StdRng {
        StdRng::seed_from_u64(self.seed)
    }

    /// Copy with a different seed, used to give parallel jobs independent streams
    pub fn with_seed(&self, seed: u64) -> Self {
        SynthesisConfig { seed, ..self.clone() }
    }
}

/// Creates the default config to easily call the code from other rust packages.
pub fn config_from_seed(seed: u64) -> SynthesisConfig {
    SynthesisConfig { seed, ..SynthesisConfig::default() }
}

use std::f64::consts::TAU;
use log::{debug, info, warn};
use num_complex::Complex64;
use ndarray::Array2;
use rand::{rngs::StdRng, Rng};

use crate::quantum::circuit::TemplateEntry;
use super::config::SynthesisConfig;
use super::minimize::{BoundedMinimizer, BoundedNelderMead, Bounds, MinimizeResult, ProjectedLbfgs};
use super::objective::FitObjective;
use super::template::{entries_from_angles, template_unitary, TemplateShape};
use super::{round2, Result, SynthesisError};

/// An accepted template instantiation
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    pub shape: TemplateShape,
    pub depth: usize,
    /// Angles rounded to two decimals; `angles[0]` is the global phase
    pub angles: Vec<f64>,
    /// Residual of the rounded angles
    pub residual: f64,
}

impl Synthesis {
    /// Unbound gate sequence, global phase dropped
    pub fn entries(&self) -> Result<Vec<TemplateEntry>> {
        entries_from_angles(self.shape, &self.angles)
    }

    /// Unitary of the accepted template, global phase included
    pub fn unitary(&self) -> Result<Array2<Complex64>> {
        template_unitary(self.shape, self.depth, &self.angles)
    }
}

/// Depth-escalating, restart-based template fitter
#[derive(Debug)]
pub struct Synthesizer {
    config: SynthesisConfig,
    rng: StdRng,
    one_qubit: Box<dyn BoundedMinimizer>,
    two_qubit: Box<dyn BoundedMinimizer>,
}

impl Synthesizer {
    /// Quasi-Newton for one-qubit targets, simplex search for two-qubit targets
    pub fn new(config: SynthesisConfig) -> Self {
        let one_qubit = ProjectedLbfgs::new(config.gradient_tolerance, config.max_iterations);
        let two_qubit = BoundedNelderMead::new(config.simplex_tolerance, config.max_iterations);
        Synthesizer::with_minimizers(config, Box::new(one_qubit), Box::new(two_qubit))
    }

    pub fn with_minimizers(
        config: SynthesisConfig,
        one_qubit: Box<dyn BoundedMinimizer>,
        two_qubit: Box<dyn BoundedMinimizer>,
    ) -> Self {
        Synthesizer {
            rng: config.rng(),
            config,
            one_qubit,
            two_qubit,
        }
    }

    pub fn config(&self) -> &SynthesisConfig {
        &self.config
    }

    /// Find the shallowest template matching `target` up to global phase
    pub fn synthesize(&mut self, target: &Array2<Complex64>) -> Result<Synthesis> {
        let shape = TemplateShape::for_matrix(target)?;

        for attempt in 1..=self.config.max_attempts {
            if let Some(synthesis) = self.search_depths(target, shape)? {
                return Ok(synthesis);
            }
            warn!("attempt {}/{}: no depth reached zero residual", attempt, self.config.max_attempts);
        }

        Err(SynthesisError::Exhausted { attempts: self.config.max_attempts })
    }

    /// One sweep over depths 1..=max_depth
    fn search_depths(&mut self, target: &Array2<Complex64>, shape: TemplateShape) -> Result<Option<Synthesis>> {
        for depth in 1..=self.config.max_depth.min(3) {
            let objective = FitObjective::new(target, depth)?;

            let run = match self.converged_run(&objective) {
                Ok(run) => run,
                Err(e @ SynthesisError::OptimizerNonconvergence { .. }) => {
                    warn!("{}; escalating", e);
                    continue;
                }
                Err(e) => return Err(e),
            };

            if (run.fun * 100.0).floor() != 0.0 {
                debug!("{:?} depth {}: residual {:.4} too large", shape, depth, run.fun);
                continue;
            }

            let angles: Vec<f64> = run.x.iter().map(|&a| round2(a)).collect();
            let residual = objective.evaluate(&angles)?;
            info!("{:?} depth {} accepted: angles {:?}, residual {:.2e}", shape, depth, angles, residual);
            return Ok(Some(Synthesis { shape, depth, angles, residual }));
        }

        Ok(None)
    }

    /// Minimize from fresh random starts until the optimizer reports convergence
    fn converged_run(&mut self, objective: &FitObjective) -> Result<MinimizeResult> {
        let dimension = objective.dimension();
        let bounds = vec![Bounds::new(0.0, TAU); dimension];
        let minimizer = match objective.shape() {
            TemplateShape::OneQubit => self.one_qubit.as_ref(),
            TemplateShape::TwoQubit => self.two_qubit.as_ref(),
        };
        let f = objective.as_fn();

        for restart in 0..self.config.max_restarts {
            let x0: Vec<f64> = (0..dimension).map(|_| self.rng.gen_range(0.0..TAU)).collect();
            let run = minimizer.minimize(&f, &x0, &bounds);
            if run.success {
                debug!(
                    "{} depth {} converged after {} iterations (restart {}): {:.4e}",
                    minimizer.name(), objective.depth(), run.iterations, restart, run.fun
                );
                return Ok(run);
            }
            debug!("{} depth {} restart {}: {}", minimizer.name(), objective.depth(), restart, run.message);
        }

        Err(SynthesisError::OptimizerNonconvergence {
            depth: objective.depth(),
            restarts: self.config.max_restarts,
        })
    }
}

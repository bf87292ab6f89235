//! Box-constrained local minimizers
//!
//! Two strategies: a projected limited-memory quasi-Newton method driven by a
//! finite-difference gradient, and a derivative-free Nelder–Mead simplex whose
//! trial points are clamped into the box. Both report whether they converged,
//! so the synthesizer can restart from a fresh point when they do not.

use std::collections::VecDeque;
use std::fmt::Debug;

/// Closed interval a coordinate is confined to
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Bounds {
    pub fn new(lower: f64, upper: f64) -> Self {
        Bounds { lower, upper }
    }

    pub fn clamp(&self, x: f64) -> f64 {
        x.clamp(self.lower, self.upper)
    }
}

/// Outcome of a single local minimization
#[derive(Debug, Clone, PartialEq)]
pub struct MinimizeResult {
    pub x: Vec<f64>,
    pub fun: f64,
    pub success: bool,
    pub iterations: usize,
    pub message: &'static str,
}

/// Trait for local minimizers over a box
pub trait BoundedMinimizer: Debug + Send + Sync {
    /// Short name used in log output
    fn name(&self) -> &'static str;

    /// Minimize `f` from `x0`; `bounds` holds one interval per coordinate
    fn minimize(&self, f: &dyn Fn(&[f64]) -> f64, x0: &[f64], bounds: &[Bounds]) -> MinimizeResult;
}

fn project(x: &mut [f64], bounds: &[Bounds]) {
    for (xi, b) in x.iter_mut().zip(bounds) {
        *xi = b.clamp(*xi);
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Central-difference gradient
fn gradient(f: &dyn Fn(&[f64]) -> f64, x: &[f64], step: f64) -> Vec<f64> {
    let mut probe = x.to_vec();
    (0..x.len())
        .map(|i| {
            let xi = probe[i];
            probe[i] = xi + step;
            let forward = f(&probe);
            probe[i] = xi - step;
            let backward = f(&probe);
            probe[i] = xi;
            (forward - backward) / (2.0 * step)
        })
        .collect()
}

/// Coordinates pinned at a bound with the gradient pushing outward
fn active_set(x: &[f64], g: &[f64], bounds: &[Bounds]) -> Vec<bool> {
    x.iter()
        .zip(g)
        .zip(bounds)
        .map(|((&xi, &gi), b)| (xi <= b.lower && gi > 0.0) || (xi >= b.upper && gi < 0.0))
        .collect()
}

/// Projected limited-memory BFGS.
///
/// Converges when the projected gradient's infinity norm drops below
/// `gradient_tolerance`, or when a step's relative reduction of `f` drops below
/// `function_tolerance`.
#[derive(Debug, Clone)]
pub struct ProjectedLbfgs {
    pub gradient_tolerance: f64,
    pub function_tolerance: f64,
    pub memory: usize,
    pub max_iterations: usize,
    pub max_line_search: usize,
    pub difference_step: f64,
}

impl Default for ProjectedLbfgs {
    fn default() -> Self {
        ProjectedLbfgs {
            gradient_tolerance: 1e-6,
            function_tolerance: 2.2e-9,
            memory: 10,
            max_iterations: 2000,
            max_line_search: 40,
            difference_step: 1e-6,
        }
    }
}

impl ProjectedLbfgs {
    pub fn new(gradient_tolerance: f64, max_iterations: usize) -> Self {
        ProjectedLbfgs {
            gradient_tolerance,
            max_iterations,
            ..ProjectedLbfgs::default()
        }
    }

    /// Two-loop recursion: approximate inverse Hessian times `g`
    fn inverse_hessian_product(history: &VecDeque<(Vec<f64>, Vec<f64>, f64)>, g: &[f64]) -> Vec<f64> {
        let mut q = g.to_vec();
        let mut alphas = Vec::with_capacity(history.len());

        for (s, y, rho) in history.iter().rev() {
            let a = rho * dot(s, &q);
            for (qi, yi) in q.iter_mut().zip(y) {
                *qi -= a * yi;
            }
            alphas.push(a);
        }

        let gamma = match history.back() {
            Some((s, y, _)) => dot(s, y) / dot(y, y),
            None => 1.0,
        };
        for qi in q.iter_mut() {
            *qi *= gamma;
        }

        for ((s, y, rho), a) in history.iter().zip(alphas.iter().rev()) {
            let b = rho * dot(y, &q);
            for (qi, si) in q.iter_mut().zip(s) {
                *qi += si * (a - b);
            }
        }

        q
    }
}

impl BoundedMinimizer for ProjectedLbfgs {
    fn name(&self) -> &'static str {
        "projected-lbfgs"
    }

    fn minimize(&self, f: &dyn Fn(&[f64]) -> f64, x0: &[f64], bounds: &[Bounds]) -> MinimizeResult {
        let mut x = x0.to_vec();
        project(&mut x, bounds);
        let mut fx = f(&x);
        let mut g = gradient(f, &x, self.difference_step);
        let mut history: VecDeque<(Vec<f64>, Vec<f64>, f64)> = VecDeque::with_capacity(self.memory);

        let result = |x: Vec<f64>, fun: f64, success: bool, iterations: usize, message: &'static str| {
            MinimizeResult { x, fun, success, iterations, message }
        };

        for iteration in 0..self.max_iterations {
            if !fx.is_finite() {
                return result(x, fx, false, iteration, "objective is not finite");
            }

            let active = active_set(&x, &g, bounds);
            let projected: Vec<f64> = g
                .iter()
                .zip(&active)
                .map(|(&gi, &pinned)| if pinned { 0.0 } else { gi })
                .collect();

            let norm = projected.iter().fold(0.0_f64, |m, v| m.max(v.abs()));
            if norm <= self.gradient_tolerance {
                return result(x, fx, true, iteration, "projected gradient below tolerance");
            }

            let mut direction: Vec<f64> = Self::inverse_hessian_product(&history, &projected)
                .into_iter()
                .zip(&active)
                .map(|(d, &pinned)| if pinned { 0.0 } else { -d })
                .collect();

            if dot(&direction, &projected) >= 0.0 {
                // Curvature pairs went stale against the bounds; fall back to steepest descent
                history.clear();
                direction = projected.iter().map(|v| -v).collect();
            }

            let mut step = 1.0;
            let mut accepted = None;
            for _ in 0..self.max_line_search {
                let mut candidate: Vec<f64> = x.iter().zip(&direction).map(|(xi, di)| xi + step * di).collect();
                project(&mut candidate, bounds);
                let f_candidate = f(&candidate);
                let moved: Vec<f64> = candidate.iter().zip(&x).map(|(c, xi)| c - xi).collect();
                if f_candidate <= fx + 1e-4 * dot(&g, &moved) {
                    accepted = Some((candidate, f_candidate));
                    break;
                }
                step *= 0.5;
            }

            let Some((x_new, f_new)) = accepted else {
                return result(x, fx, false, iteration, "line search failed");
            };

            let g_new = gradient(f, &x_new, self.difference_step);
            let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
            let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();
            let sy = dot(&s, &y);
            if sy > 1e-10 {
                if history.len() == self.memory {
                    history.pop_front();
                }
                history.push_back((s, y, 1.0 / sy));
            }

            let reduction = fx - f_new;
            let scale = fx.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            fx = f_new;
            g = g_new;

            if reduction <= self.function_tolerance * scale {
                return result(x, fx, true, iteration + 1, "relative reduction below tolerance");
            }
        }

        result(x, fx, false, self.max_iterations, "iteration limit reached")
    }
}

/// Nelder–Mead simplex with trial points clamped into the box.
///
/// Converges when both the spread of function values across the simplex and its
/// coordinate extent fall below their tolerances.
#[derive(Debug, Clone)]
pub struct BoundedNelderMead {
    pub function_tolerance: f64,
    pub point_tolerance: f64,
    pub initial_step: f64,
    pub max_iterations: usize,
}

impl Default for BoundedNelderMead {
    fn default() -> Self {
        BoundedNelderMead {
            function_tolerance: 1e-8,
            point_tolerance: 1e-4,
            initial_step: 0.5,
            max_iterations: 2000,
        }
    }
}

impl BoundedNelderMead {
    pub fn new(function_tolerance: f64, max_iterations: usize) -> Self {
        BoundedNelderMead {
            function_tolerance,
            max_iterations,
            ..BoundedNelderMead::default()
        }
    }
}

/// `base + t * (toward - base)`, clamped
fn along(base: &[f64], toward: &[f64], t: f64, bounds: &[Bounds]) -> Vec<f64> {
    let mut point: Vec<f64> = base.iter().zip(toward).map(|(b, w)| b + t * (w - b)).collect();
    project(&mut point, bounds);
    point
}

impl BoundedMinimizer for BoundedNelderMead {
    fn name(&self) -> &'static str {
        "bounded-nelder-mead"
    }

    fn minimize(&self, f: &dyn Fn(&[f64]) -> f64, x0: &[f64], bounds: &[Bounds]) -> MinimizeResult {
        let n = x0.len();
        let mut start = x0.to_vec();
        project(&mut start, bounds);

        let mut simplex = vec![start.clone()];
        for (i, b) in bounds.iter().enumerate().take(n) {
            let mut vertex = start.clone();
            vertex[i] = if vertex[i] + self.initial_step <= b.upper {
                vertex[i] + self.initial_step
            } else {
                vertex[i] - self.initial_step
            };
            project(&mut vertex, bounds);
            simplex.push(vertex);
        }
        let mut values: Vec<f64> = simplex.iter().map(|v| f(v)).collect();

        for iteration in 0..self.max_iterations {
            let mut order: Vec<usize> = (0..=n).collect();
            order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
            simplex = order.iter().map(|&i| simplex[i].clone()).collect();
            values = order.iter().map(|&i| values[i]).collect();

            let f_spread = values[n] - values[0];
            let x_spread = simplex[1..]
                .iter()
                .flat_map(|v| v.iter().zip(&simplex[0]).map(|(a, b)| (a - b).abs()))
                .fold(0.0_f64, f64::max);
            if f_spread <= self.function_tolerance && x_spread <= self.point_tolerance {
                return MinimizeResult {
                    x: simplex.swap_remove(0),
                    fun: values[0],
                    success: true,
                    iterations: iteration,
                    message: "simplex collapsed below tolerance",
                };
            }

            let mut centroid = vec![0.0; n];
            for vertex in &simplex[..n] {
                for (c, v) in centroid.iter_mut().zip(vertex) {
                    *c += v / n as f64;
                }
            }

            let worst = simplex[n].clone();
            let reflected = along(&centroid, &worst, -1.0, bounds);
            let f_reflected = f(&reflected);

            if f_reflected < values[0] {
                let expanded = along(&centroid, &worst, -2.0, bounds);
                let f_expanded = f(&expanded);
                if f_expanded < f_reflected {
                    simplex[n] = expanded;
                    values[n] = f_expanded;
                } else {
                    simplex[n] = reflected;
                    values[n] = f_reflected;
                }
                continue;
            }

            if f_reflected < values[n - 1] {
                simplex[n] = reflected;
                values[n] = f_reflected;
                continue;
            }

            let (contracted, threshold) = if f_reflected < values[n] {
                (along(&centroid, &reflected, 0.5, bounds), f_reflected)
            } else {
                (along(&centroid, &worst, 0.5, bounds), values[n])
            };
            let f_contracted = f(&contracted);
            if f_contracted <= threshold {
                simplex[n] = contracted;
                values[n] = f_contracted;
                continue;
            }

            // Shrink toward the best vertex
            let best = simplex[0].clone();
            for i in 1..=n {
                simplex[i] = along(&best, &simplex[i], 0.5, bounds);
                values[i] = f(&simplex[i]);
            }
        }

        let best = (0..=n)
            .min_by(|&a, &b| values[a].total_cmp(&values[b]))
            .unwrap_or(0);
        MinimizeResult {
            x: simplex.swap_remove(best),
            fun: values[best],
            success: false,
            iterations: self.max_iterations,
            message: "iteration limit reached",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn quadratic(x: &[f64]) -> f64 {
        (x[0] - 1.0).powi(2) + 3.0 * (x[1] - 2.0).powi(2)
    }

    #[test]
    fn test_lbfgs_interior_minimum() {
        let bounds = [Bounds::new(-5.0, 5.0); 2];
        let result = ProjectedLbfgs::default().minimize(&quadratic, &[4.0, -3.0], &bounds);
        assert!(result.success, "{}", result.message);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.x[1], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_lbfgs_stops_on_bound() {
        // Unconstrained minimum at x1 = 2 lies outside the box
        let bounds = [Bounds::new(-5.0, 5.0), Bounds::new(-1.0, 0.5)];
        let result = ProjectedLbfgs::default().minimize(&quadratic, &[0.0, 0.0], &bounds);
        assert!(result.success, "{}", result.message);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.x[1], 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_nelder_mead_interior_minimum() {
        let bounds = [Bounds::new(-5.0, 5.0); 2];
        let result = BoundedNelderMead::default().minimize(&quadratic, &[4.0, -3.0], &bounds);
        assert!(result.success, "{}", result.message);
        assert_abs_diff_eq!(result.x[0], 1.0, epsilon = 1e-3);
        assert_abs_diff_eq!(result.x[1], 2.0, epsilon = 1e-3);
    }

    #[test]
    fn test_nelder_mead_tolerates_kinks() {
        let kinked = |x: &[f64]| (x[0] - 0.3).abs() + (x[1] + 0.2).abs();
        let bounds = [Bounds::new(-1.0, 1.0); 2];
        let result = BoundedNelderMead::default().minimize(&kinked, &[0.9, 0.9], &bounds);
        assert!(result.fun < 1e-3);
        assert!(result.x.iter().zip(&bounds).all(|(x, b)| *x >= b.lower && *x <= b.upper));
    }

    #[test]
    fn test_iteration_limit_reports_failure() {
        let minimizer = ProjectedLbfgs { max_iterations: 1, ..ProjectedLbfgs::default() };
        let rosenbrock = |x: &[f64]| (1.0 - x[0]).powi(2) + 100.0 * (x[1] - x[0] * x[0]).powi(2);
        let bounds = [Bounds::new(-2.0, 2.0); 2];
        let result = minimizer.minimize(&rosenbrock, &[-1.5, 1.5], &bounds);
        assert!(!result.success);
    }
}

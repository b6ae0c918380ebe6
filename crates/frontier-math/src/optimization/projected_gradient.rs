//! Spectral projected gradient (SPG) for box-constrained problems.
//!
//! Birgin, Martínez & Raydan's nonmonotone SPG: Barzilai-Borwein step
//! lengths, projection onto the box, and a safeguarded quadratic
//! backtracking line search against the max of the last few objective
//! values. Gradients are central finite differences.

use std::collections::VecDeque;

use crate::linear_algebra::dot;

/// Number of past objective values the nonmonotone line search compares to.
const NONMONOTONE_WINDOW: usize = 10;

/// Sufficient decrease parameter.
const ARMIJO_GAMMA: f64 = 1e-4;

const MIN_SPECTRAL_STEP: f64 = 1e-12;
const MAX_SPECTRAL_STEP: f64 = 1e12;
const MIN_LINE_SEARCH_STEP: f64 = 1e-14;

/// Outcome of a single bound-constrained run.
#[derive(Debug, Clone)]
pub(crate) struct BoxSolution {
    pub x: Vec<f64>,
    pub value: f64,
    pub iterations: u32,
    pub converged: bool,
}

/// Settings for one inner solve.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BoxSettings {
    pub gradient_tolerance: f64,
    pub function_tolerance: f64,
    pub max_iterations: u32,
    pub step_size: f64,
}

/// Clamps `x` into `[lo, hi]` componentwise.
pub(crate) fn project(x: &mut [f64], bounds: &[(f64, f64)]) {
    for (xi, &(lo, hi)) in x.iter_mut().zip(bounds) {
        *xi = xi.clamp(lo, hi);
    }
}

/// Central-difference gradient. Falls back to a one-sided difference when one
/// side is not finite, and to zero when neither is.
pub(crate) fn numerical_gradient<F>(f: &F, x: &[f64], fx: f64, step_size: f64) -> Vec<f64>
where
    F: Fn(&[f64]) -> f64,
{
    let mut probe = x.to_vec();
    let mut gradient = vec![0.0; x.len()];

    for i in 0..x.len() {
        let h = step_size * x[i].abs().max(1.0);
        let original = probe[i];

        probe[i] = original + h;
        let f_plus = f(&probe);
        probe[i] = original - h;
        let f_minus = f(&probe);
        probe[i] = original;

        gradient[i] = match (f_plus.is_finite(), f_minus.is_finite()) {
            (true, true) => (f_plus - f_minus) / (2.0 * h),
            (true, false) => (f_plus - fx) / h,
            (false, true) => (fx - f_minus) / h,
            (false, false) => 0.0,
        };
    }

    gradient
}

fn inf_norm(v: &[f64]) -> f64 {
    v.iter().fold(0.0_f64, |acc, x| acc.max(x.abs()))
}

/// `P(x - t·g) - x`
fn projected_direction(x: &[f64], g: &[f64], t: f64, bounds: &[(f64, f64)]) -> Vec<f64> {
    let mut trial: Vec<f64> = x.iter().zip(g).map(|(xi, gi)| xi - t * gi).collect();
    project(&mut trial, bounds);
    trial.iter().zip(x).map(|(p, xi)| p - xi).collect()
}

/// Minimizes `f` over the box starting from `x0` (projected first).
pub(crate) fn spg<F>(f: &F, x0: &[f64], bounds: &[(f64, f64)], settings: BoxSettings) -> BoxSolution
where
    F: Fn(&[f64]) -> f64,
{
    let mut x = x0.to_vec();
    project(&mut x, bounds);

    let mut fx = f(&x);
    if !fx.is_finite() {
        return BoxSolution {
            x,
            value: fx,
            iterations: 0,
            converged: false,
        };
    }

    let mut g = numerical_gradient(f, &x, fx, settings.step_size);
    let first = inf_norm(&projected_direction(&x, &g, 1.0, bounds));
    let mut spectral = if first > 0.0 {
        (1.0 / first).clamp(MIN_SPECTRAL_STEP, MAX_SPECTRAL_STEP)
    } else {
        1.0
    };

    let mut history: VecDeque<f64> = VecDeque::with_capacity(NONMONOTONE_WINDOW);
    history.push_back(fx);

    for iteration in 0..settings.max_iterations {
        let pg_norm = inf_norm(&projected_direction(&x, &g, 1.0, bounds));
        if pg_norm <= settings.gradient_tolerance {
            return BoxSolution {
                x,
                value: fx,
                iterations: iteration,
                converged: true,
            };
        }

        let d = projected_direction(&x, &g, spectral, bounds);
        let gtd = dot(&g, &d);
        if gtd >= 0.0 {
            // Numerical noise: no descent direction left at this resolution.
            return BoxSolution {
                x,
                value: fx,
                iterations: iteration,
                converged: pg_norm <= settings.gradient_tolerance.sqrt(),
            };
        }

        let f_ref = history.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mut lambda = 1.0;
        let (x_new, f_new) = loop {
            let candidate: Vec<f64> = x.iter().zip(&d).map(|(xi, di)| xi + lambda * di).collect();
            let f_candidate = f(&candidate);

            if f_candidate.is_finite() && f_candidate <= f_ref + ARMIJO_GAMMA * lambda * gtd {
                break (candidate, f_candidate);
            }

            if lambda < MIN_LINE_SEARCH_STEP {
                log::trace!("spg line search stalled at iteration {iteration}");
                return BoxSolution {
                    x,
                    value: fx,
                    iterations: iteration,
                    converged: false,
                };
            }

            let interpolated = if f_candidate.is_finite() {
                let denom = 2.0 * (f_candidate - fx - lambda * gtd);
                if denom > 0.0 {
                    -gtd * lambda * lambda / denom
                } else {
                    lambda / 2.0
                }
            } else {
                lambda / 2.0
            };
            lambda = if interpolated >= 0.1 * lambda && interpolated <= 0.9 * lambda {
                interpolated
            } else {
                lambda / 2.0
            };
        };

        let s: Vec<f64> = x_new.iter().zip(&x).map(|(a, b)| a - b).collect();
        let g_new = numerical_gradient(f, &x_new, f_new, settings.step_size);
        let y: Vec<f64> = g_new.iter().zip(&g).map(|(a, b)| a - b).collect();

        let sty = dot(&s, &y);
        spectral = if sty > 0.0 {
            (dot(&s, &s) / sty).clamp(MIN_SPECTRAL_STEP, MAX_SPECTRAL_STEP)
        } else {
            MAX_SPECTRAL_STEP
        };

        let f_change = (fx - f_new).abs();
        let step_norm = inf_norm(&s);

        x = x_new;
        fx = f_new;
        g = g_new;

        if history.len() == NONMONOTONE_WINDOW {
            history.pop_front();
        }
        history.push_back(fx);

        if f_change <= settings.function_tolerance * (1.0 + fx.abs())
            && step_norm <= settings.function_tolerance.sqrt()
        {
            return BoxSolution {
                x,
                value: fx,
                iterations: iteration + 1,
                converged: true,
            };
        }
    }

    BoxSolution {
        x,
        value: fx,
        iterations: settings.max_iterations,
        converged: false,
    }
}

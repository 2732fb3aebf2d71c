//! Levenberg–Marquardt minimisation of `Σ r_i(x)²`.
//!
//! Each iteration:
//!
//! 1. builds the Jacobian by forward differences (columns in parallel)
//! 2. solves the damped step `[J; √λ D] δ = [-r; 0]` with SVD
//! 3. accepts the step if the sum of squares drops (λ shrinks), otherwise
//!    retries with a larger λ
//!
//! `D` is the running maximum of the Jacobian column norms (Marquardt scaling),
//! which keeps the damping invariant to parameter units.
//!
//! The residual closure is the only coupling to the profile models, so this
//! module knows nothing about depths or splines.

use std::time::Instant;

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::domain::{SolverOptions, SolverStatus, Termination};
use crate::error::AppError;
use crate::math::ols::solve_damped_step;

/// λ above which we give up looking for a downhill step.
const LAMBDA_MAX: f64 = 1e16;

/// Floor for column scales so an inactive parameter stays damped.
const SCALE_FLOOR: f64 = 1e-12;

/// Solver output.
#[derive(Debug, Clone)]
pub struct LmOutcome {
    pub params: Vec<f64>,
    pub residuals: Vec<f64>,
    pub sse: f64,
    pub status: SolverStatus,
}

/// Minimise the sum of squared residuals starting from `x0`.
///
/// `residuals` must return the same number of values on every call.
pub fn minimize<F>(residuals: F, x0: &[f64], opts: &SolverOptions) -> Result<LmOutcome, AppError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, AppError> + Sync,
{
    opts.validate()?;
    if x0.is_empty() {
        return Err(AppError::invalid_parameters("Cannot minimise over an empty parameter vector."));
    }
    if let Some(bounds) = &opts.bounds {
        if bounds.len() != x0.len() {
            return Err(AppError::invalid_parameters(format!(
                "Bounds length ({}) != parameter count ({}).",
                bounds.len(),
                x0.len()
            )));
        }
    }

    let start = Instant::now();
    let n = x0.len();

    let mut x = x0.to_vec();
    project(&mut x, opts);
    let mut r = residuals(&x)?;
    let m = r.len();
    if m == 0 {
        return Err(AppError::degenerate("Residual function returned no values."));
    }
    if r.iter().any(|v| !v.is_finite()) {
        return Err(AppError::degenerate("Residuals are not finite at the initial guess."));
    }
    let mut sse = sum_sq(&r);
    let mut evaluations = 1usize;

    let mut lambda = opts.lambda_init;
    let mut scale = vec![SCALE_FLOOR; n];
    let mut termination = Termination::MaxIterations;
    let mut iterations = 0usize;

    'outer: for iter in 0..opts.max_iterations {
        if sse == 0.0 {
            termination = Termination::ExactFit;
            break;
        }
        if let Some(budget) = opts.time_budget {
            if start.elapsed() >= budget {
                termination = Termination::TimeBudget;
                break;
            }
        }
        iterations = iter + 1;

        let jac = jacobian(&residuals, &x, &r, opts)?;
        evaluations += n;
        for (j, s) in scale.iter_mut().enumerate() {
            *s = s.max(jac.column(j).norm());
        }
        let r_vec = DVector::from_column_slice(&r);

        loop {
            let Some(delta) = solve_damped_step(&jac, &r_vec, &scale, lambda) else {
                lambda *= opts.lambda_up;
                if lambda > LAMBDA_MAX {
                    termination = Termination::Stalled;
                    break 'outer;
                }
                continue;
            };

            let mut trial: Vec<f64> = x.iter().zip(delta.iter()).map(|(a, d)| a + d).collect();
            project(&mut trial, opts);

            let step_norm = norm_diff(&trial, &x);
            let x_norm = norm(&x);
            if step_norm <= opts.xtol * (opts.xtol + x_norm) {
                termination = Termination::StepSize;
                break 'outer;
            }

            let r_trial = residuals(&trial)?;
            evaluations += 1;
            if r_trial.len() != m {
                return Err(AppError::degenerate(format!(
                    "Residual length changed from {m} to {}.",
                    r_trial.len()
                )));
            }
            let sse_trial = sum_sq(&r_trial);

            if sse_trial.is_finite() && sse_trial < sse {
                // Predicted reduction from the linear model: ‖r‖² - ‖r + J δ‖².
                let actual_step = DVector::from_iterator(n, trial.iter().zip(x.iter()).map(|(a, b)| a - b));
                let predicted = (&r_vec + &jac * actual_step).norm_squared();
                let pred_rel = ((sse - predicted) / sse).abs();
                let actual_rel = (sse - sse_trial) / sse;

                trace!(iter, sse = sse_trial, lambda, "accepted step");
                x = trial;
                r = r_trial;
                sse = sse_trial;
                lambda = (lambda * opts.lambda_down).max(f64::MIN_POSITIVE);

                if actual_rel <= opts.ftol && pred_rel <= opts.ftol {
                    termination = Termination::SumOfSquares;
                    break 'outer;
                }
                break;
            }

            lambda *= opts.lambda_up;
            trace!(iter, sse_trial, lambda, "rejected step");
            if lambda > LAMBDA_MAX {
                termination = Termination::Stalled;
                break 'outer;
            }
        }
    }

    if termination == Termination::MaxIterations && sse == 0.0 {
        termination = Termination::ExactFit;
    }

    let status = SolverStatus {
        converged: termination.is_converged(),
        termination,
        iterations,
        evaluations,
    };
    debug!(
        sse,
        iterations,
        evaluations,
        termination = termination.display_name(),
        "levenberg-marquardt finished"
    );

    Ok(LmOutcome {
        params: x,
        residuals: r,
        sse,
        status,
    })
}

/// Forward-difference Jacobian `∂r_i / ∂x_j`.
///
/// Each column needs one residual evaluation and is independent of the others.
fn jacobian<F>(residuals: &F, x: &[f64], r: &[f64], opts: &SolverOptions) -> Result<DMatrix<f64>, AppError>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, AppError> + Sync,
{
    let m = r.len();
    let n = x.len();

    let columns: Vec<Result<(usize, Vec<f64>), AppError>> = (0..n)
        .into_par_iter()
        .map(|j| {
            let mut h = opts.fd_step * x[j].abs().max(1.0);
            // Step backwards when the forward point would leave the box.
            if let Some(bounds) = &opts.bounds {
                if x[j] + h > bounds[j].1 {
                    h = -h;
                }
            }
            let mut x_pert = x.to_vec();
            x_pert[j] += h;
            let r_pert = residuals(&x_pert)?;
            if r_pert.len() != m {
                return Err(AppError::degenerate(format!(
                    "Residual length changed from {m} to {}.",
                    r_pert.len()
                )));
            }
            let col = r_pert.iter().zip(r.iter()).map(|(a, b)| (a - b) / h).collect();
            Ok((j, col))
        })
        .collect();

    let mut jac = DMatrix::<f64>::zeros(m, n);
    for col in columns {
        let (j, values) = col?;
        for (i, v) in values.into_iter().enumerate() {
            // A non-finite derivative carries no usable direction.
            jac[(i, j)] = if v.is_finite() { v } else { 0.0 };
        }
    }
    Ok(jac)
}

fn project(x: &mut [f64], opts: &SolverOptions) {
    if let Some(bounds) = &opts.bounds {
        for (v, &(lo, hi)) in x.iter_mut().zip(bounds.iter()) {
            *v = v.clamp(lo, hi);
        }
    }
}

fn sum_sq(values: &[f64]) -> f64 {
    values.iter().map(|v| v * v).sum()
}

fn norm(values: &[f64]) -> f64 {
    sum_sq(values).sqrt()
}

fn norm_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

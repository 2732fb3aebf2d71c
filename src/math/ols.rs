//! Dense linear least squares.
//!
//! Each Levenberg–Marquardt iteration needs the step `δ` minimising
//!
//! ```text
//! ‖ J δ + r ‖² + λ ‖ D δ ‖²
//! ```
//!
//! which is the ordinary least-squares problem on the stacked system
//! `[J; √λ D] δ = [-r; 0]`. We solve it with SVD because the stacked matrix is
//! tall, and because spline Jacobians become rank deficient whenever a control
//! point's support misses every depth sample.

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Loosen the singular-value cutoff until the solve succeeds.
    for &tol in &[1e-14, 1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Solve the damped step `[J; √λ D] δ = [-r; 0]`.
///
/// `scale` holds the diagonal of `D` (one entry per parameter).
pub fn solve_damped_step(
    jacobian: &DMatrix<f64>,
    residuals: &DVector<f64>,
    scale: &[f64],
    lambda: f64,
) -> Option<DVector<f64>> {
    let (m, n) = jacobian.shape();
    let mut a = DMatrix::<f64>::zeros(m + n, n);
    let mut b = DVector::<f64>::zeros(m + n);

    a.view_mut((0, 0), (m, n)).copy_from(jacobian);
    for i in 0..m {
        b[i] = -residuals[i];
    }
    let sl = lambda.max(0.0).sqrt();
    for j in 0..n {
        a[(m + j, j)] = sl * scale[j];
    }

    solve_least_squares(&a, &b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn undamped_step_is_gauss_newton() {
        // r(x) = J x - y at x = 0 gives r = -y; the step must land on the solution.
        let j = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let r = DVector::from_row_slice(&[-2.0, -5.0, -8.0]);
        let step = solve_damped_step(&j, &r, &[1.0, 1.0], 0.0).unwrap();
        assert!((step[0] - 2.0).abs() < 1e-10);
        assert!((step[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn damping_shrinks_the_step() {
        let j = DMatrix::from_row_slice(2, 1, &[1.0, 1.0]);
        let r = DVector::from_row_slice(&[-1.0, -1.0]);
        let free = solve_damped_step(&j, &r, &[1.0], 0.0).unwrap();
        let damped = solve_damped_step(&j, &r, &[1.0], 10.0).unwrap();
        assert!(damped[0].abs() < free[0].abs());
    }
}

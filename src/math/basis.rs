//! Uniform B-spline bases used by the spline and histogram profile models.
//!
//! Both evaluators take a normalised abscissa `z` (one unit per knot interval)
//! and a control-point vector `w`:
//!
//! - `constant_spline(z, w) = w[floor(z)]` (degree 0, one bin per control point)
//! - `cubic_spline(z, w) = Σ_i w[i] · β3(z - i + 1)` (degree 3, cardinal)
//!
//! Numerical notes:
//! - With `n` cubic control points the curve is fully supported on
//!   `z ∈ [0, n - 3]`; outside that range the missing neighbours count as zero,
//!   so the curve decays smoothly to 0 instead of extrapolating.
//! - At `z = 0` the cubic value is `(w0 + 4 w1 + w2) / 6` and the first and second
//!   derivatives depend only on `w0..w2`. Three leading zeros therefore pin the
//!   curve, its slope and its curvature to zero at the start.
//! - Bins are half-open `[i, i + 1)`; the final edge `z = n` is closed so a
//!   sample exactly at the total thickness lands in the last bin.

/// Degree-0 (histogram) basis.
pub fn constant_spline(z: f64, w: &[f64]) -> f64 {
    let n = w.len();
    if n == 0 || !z.is_finite() || z < 0.0 {
        return 0.0;
    }

    let idx = z.floor() as usize;
    if idx < n {
        w[idx]
    } else if z == n as f64 {
        w[n - 1]
    } else {
        0.0
    }
}

/// Degree-3 uniform B-spline basis.
pub fn cubic_spline(z: f64, w: &[f64]) -> f64 {
    if w.is_empty() || !z.is_finite() {
        return 0.0;
    }
    // No control point reaches past these; also keeps the index cast in range.
    if z <= -3.0 || z >= w.len() as f64 {
        return 0.0;
    }

    // Only w[k..=k+3] have β3(z - i + 1) ≠ 0, with k = floor(z).
    let k = z.floor() as i64;
    let mut acc = 0.0;
    for i in k..=k + 3 {
        if i < 0 || i >= w.len() as i64 {
            continue;
        }
        acc += w[i as usize] * cardinal_cubic(z - i as f64 + 1.0);
    }
    acc
}

/// Centered cardinal cubic B-spline, supported on `(-2, 2)`.
fn cardinal_cubic(x: f64) -> f64 {
    let ax = x.abs();
    if ax < 1.0 {
        (4.0 - 6.0 * ax * ax + 3.0 * ax * ax * ax) / 6.0
    } else if ax < 2.0 {
        let u = 2.0 - ax;
        u * u * u / 6.0
    } else {
        0.0
    }
}

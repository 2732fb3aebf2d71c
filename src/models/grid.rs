//! Depth grids.
//!
//! A sample's damaged layer is described by its total damaged depth and the
//! number of slices it is cut into. The grid is evenly spaced from the surface
//! (`0`) to the damaged depth inclusive.

use crate::error::AppError;

/// Build `slices` evenly spaced depths over `[0, damaged_depth]`.
///
/// A zero damaged depth means the sample carries no damage at all; there is no
/// profile to evaluate, so it is reported as degenerate input.
pub fn depth_grid(damaged_depth: f64, slices: usize) -> Result<Vec<f64>, AppError> {
    if damaged_depth == 0.0 {
        return Err(AppError::degenerate("No damage: damaged depth is zero."));
    }
    if !(damaged_depth.is_finite() && damaged_depth > 0.0) {
        return Err(AppError::degenerate(format!(
            "Damaged depth must be finite and > 0, got {damaged_depth}."
        )));
    }
    if slices < 2 {
        return Err(AppError::degenerate(format!("Need at least 2 slices, got {slices}.")));
    }

    let step = damaged_depth / (slices as f64 - 1.0);
    let mut out: Vec<f64> = (0..slices).map(|i| step * i as f64).collect();
    // Pin the last sample so it hits the final basis edge exactly.
    out[slices - 1] = damaged_depth;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn grid_includes_endpoints() {
        let g = depth_grid(37.3, 11).unwrap();
        assert_eq!(g.len(), 11);
        assert_eq!(g[0], 0.0);
        assert_eq!(g[10], 37.3);
        assert!(g.windows(2).all(|w| w[1] > w[0]));
    }

    #[test]
    fn zero_damage_is_degenerate() {
        let err = depth_grid(0.0, 10).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        assert!(err.to_string().contains("No damage"));
    }

    #[test]
    fn too_few_slices() {
        assert_eq!(depth_grid(10.0, 1).unwrap_err().kind(), ErrorKind::DegenerateInput);
    }
}

//! Initial-guess and thickness policies for the fitter and resampler.

use crate::domain::ModelKind;
use crate::error::AppError;

/// Starting point for peak-shape fits:
/// `[height, loc, fwhm_low, fwhm_high, eta_low, eta_high, background]`.
///
/// Tuned for strain/DW peaks of a few percent sitting in the upper fifth of
/// the damaged layer.
pub const PEAK_INITIAL_GUESS: [f64; 7] = [2.0, 0.2, 0.1, 0.1, 0.1, 0.1, 0.05];

/// All-ones starting vector.
pub fn uniform_guess(size: usize) -> Vec<f64> {
    vec![1.0; size]
}

/// Unpacked starting vector for a fit of `model`.
///
/// Peak shapes ignore `size` and always start from `PEAK_INITIAL_GUESS`.
pub fn initial_guess(model: ModelKind, size: usize) -> Vec<f64> {
    if model.is_peak() {
        PEAK_INITIAL_GUESS.to_vec()
    } else {
        uniform_guess(size)
    }
}

/// Thickness a fit refers to.
///
/// Peak locations are measured from the deepest sample, so peak-shape fits use
/// `max(depth)`; every other model keeps the caller's thickness.
pub fn fit_thickness(model: ModelKind, depth: &[f64], thickness: f64) -> Result<f64, AppError> {
    let t = if model.is_peak() {
        depth.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    } else {
        thickness
    };
    if !(t.is_finite() && t > 0.0) {
        return Err(AppError::degenerate(format!(
            "Fit thickness must be finite and > 0, got {t}."
        )));
    }
    Ok(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn peak_guess_ignores_size() {
        assert_eq!(initial_guess(ModelKind::PeakShape, 3), PEAK_INITIAL_GUESS.to_vec());
        assert_eq!(initial_guess(ModelKind::PeakShapeInline, 12).len(), 7);
        assert_eq!(initial_guess(ModelKind::Histogram, 4), vec![1.0; 4]);
    }

    #[test]
    fn peak_thickness_is_deepest_sample() {
        let depth = [3.0, 50.0, 12.0];
        assert_eq!(fit_thickness(ModelKind::PeakShape, &depth, 999.0).unwrap(), 50.0);
        assert_eq!(fit_thickness(ModelKind::SmoothSpline, &depth, 999.0).unwrap(), 999.0);
    }

    #[test]
    fn non_positive_thickness_is_degenerate() {
        let err = fit_thickness(ModelKind::PeakShape, &[0.0, -1.0], 10.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
        let err = fit_thickness(ModelKind::Histogram, &[1.0], 0.0).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }
}

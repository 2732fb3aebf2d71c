//! Recover model parameters from measured `(depth, value)` pairs.
//!
//! Given:
//! - depth samples `d_i` and measured profile values `y_i`
//! - a model kind and (for non-peak models) a parameter count and thickness
//!
//! we minimise `Σ (model(t - d_i) - y_i)²` with Levenberg–Marquardt, where `t`
//! is the thickness. Measured data is referenced from the bottom of the layer,
//! the models from the surface; `t - d` converts between the two.

use tracing::{info, warn};

use crate::domain::{ModelKind, ProfileFit, SolverOptions};
use crate::error::AppError;
use crate::fit::guess::{fit_thickness, initial_guess};
use crate::math::{minimize, LmOutcome};
use crate::models::{check_arity, evaluate_profile, packed};

/// Fit `model` to measured data.
///
/// `parameter_size` is ignored for peak-shape models, whose thickness is also
/// replaced by `max(depth)`. For `*Inline` models the result is packed.
pub fn fit_parameters(
    depth: &[f64],
    values: &[f64],
    parameter_size: usize,
    thickness: f64,
    model: ModelKind,
    opts: &SolverOptions,
) -> Result<ProfileFit, AppError> {
    if depth.is_empty() {
        return Err(AppError::degenerate("No data points to fit."));
    }
    if depth.len() != values.len() {
        return Err(AppError::degenerate(format!(
            "Depth/value length mismatch: {} vs {}.",
            depth.len(),
            values.len()
        )));
    }
    if depth.iter().chain(values.iter()).any(|v| !v.is_finite()) {
        return Err(AppError::degenerate("Fit data contains non-finite values."));
    }

    let base = model.base();
    let thickness = fit_thickness(model, depth, thickness)?;
    let guess = initial_guess(model, parameter_size);
    check_arity(base, guess.len())?;

    let height: Vec<f64> = depth.iter().map(|&d| thickness - d).collect();
    let residuals = |p: &[f64]| -> Result<Vec<f64>, AppError> {
        let profile = evaluate_profile(&height, p, thickness, base)?;
        Ok(profile.iter().zip(values.iter()).map(|(m, y)| m - y).collect())
    };

    let outcome = minimize(residuals, &guess, opts)?;
    let fit = to_profile_fit(model, outcome, thickness);
    log_outcome("fit", &fit);
    Ok(fit)
}

/// Package a solver outcome, re-packing parameters for `*Inline` models.
pub(crate) fn to_profile_fit(model: ModelKind, outcome: LmOutcome, thickness: f64) -> ProfileFit {
    let n = outcome.residuals.len().max(1);
    let rmse = (outcome.sse / n as f64).sqrt();
    let params = if model.is_inline() {
        packed::pack(&outcome.params)
    } else {
        outcome.params
    };

    ProfileFit {
        model,
        params,
        thickness,
        sse: outcome.sse,
        rmse,
        status: outcome.status,
    }
}

pub(crate) fn log_outcome(what: &str, fit: &ProfileFit) {
    if fit.status.converged {
        info!(
            what,
            model = fit.model.display_name(),
            rmse = fit.rmse,
            iterations = fit.status.iterations,
            "solver converged"
        );
    } else {
        warn!(
            what,
            model = fit.model.display_name(),
            rmse = fit.rmse,
            iterations = fit.status.iterations,
            termination = fit.status.termination.display_name(),
            "solver did not converge; returning best-effort parameters"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn depths(n: usize, max: f64) -> Vec<f64> {
        (0..n).map(|i| max * i as f64 / (n - 1) as f64).collect()
    }

    /// Synthesize measured values the way the fitter reads them (from the bottom).
    fn measured(depth: &[f64], params: &[f64], thickness: f64, model: ModelKind) -> Vec<f64> {
        let height: Vec<f64> = depth.iter().map(|&d| thickness - d).collect();
        evaluate_profile(&height, params, thickness, model).unwrap()
    }

    fn assert_close(got: &[f64], want: &[f64], tol: f64) {
        assert_eq!(got.len(), want.len(), "got {got:?}, want {want:?}");
        for (g, w) in got.iter().zip(want.iter()) {
            assert!((g - w).abs() < tol, "got {got:?}, want {want:?}");
        }
    }

    #[test]
    fn recovers_smooth_spline() {
        let thickness = 200.0;
        let truth = [0.5, 1.5, 2.0, 1.0];
        let depth = depths(101, thickness);
        let values = measured(&depth, &truth, thickness, ModelKind::SmoothSpline);

        let fit = fit_parameters(&depth, &values, 4, thickness, ModelKind::SmoothSpline, &SolverOptions::default())
            .unwrap();
        assert!(fit.status.converged, "{:?}", fit.status);
        assert_close(&fit.params, &truth, 1e-6);
        assert!(fit.rmse < 1e-9);
    }

    #[test]
    fn recovers_histogram() {
        let thickness = 90.0;
        let truth = [1.0, 3.0, 2.0];
        let depth = depths(91, thickness);
        let values = measured(&depth, &truth, thickness, ModelKind::Histogram);

        let fit =
            fit_parameters(&depth, &values, 3, thickness, ModelKind::Histogram, &SolverOptions::default()).unwrap();
        assert_close(&fit.params, &truth, 1e-6);
    }

    #[test]
    fn recovers_peak_shape_and_uses_deepest_sample() {
        let depth = depths(401, 200.0);
        let truth = [2.4, 0.25, 0.12, 0.08, 0.15, 0.05, 0.08];
        let values = measured(&depth, &truth, 200.0, ModelKind::PeakShape);

        // The caller's thickness and size are ignored for peak shapes.
        let fit = fit_parameters(&depth, &values, 3, 1.0, ModelKind::PeakShape, &SolverOptions::default()).unwrap();
        assert_eq!(fit.thickness, 200.0);
        assert!(fit.status.converged, "{:?}", fit.status);
        assert_close(&fit.params, &truth, 1e-4);
    }

    #[test]
    fn inline_fit_returns_packed_parameters() {
        let thickness = 150.0;
        let truth = [1.2, 0.4, 0.9, 1.6, 0.3];
        let depth = depths(121, thickness);
        let values = measured(&depth, &truth, thickness, ModelKind::AbruptSpline);

        let fit = fit_parameters(
            &depth,
            &values,
            5,
            thickness,
            ModelKind::AbruptSplineInline,
            &SolverOptions::default(),
        )
        .unwrap();
        assert_eq!(fit.params.len(), 7);
        assert_eq!(fit.params[0], 5.0);
        assert_close(packed::unpack(&fit.params).unwrap(), &truth, 1e-6);
    }

    #[test]
    fn recovers_packed_peak_shape() {
        let depth = depths(401, 200.0);
        let truth = [2.4, 0.25, 0.12, 0.08, 0.15, 0.05, 0.08];
        let values = measured(&depth, &truth, 200.0, ModelKind::PeakShape);

        let fit =
            fit_parameters(&depth, &values, 0, 50.0, ModelKind::PeakShapeInline, &SolverOptions::default()).unwrap();
        assert_eq!(fit.model, ModelKind::PeakShapeInline);
        assert_eq!(fit.thickness, 200.0);
        assert_eq!(fit.params.len(), packed::HEADER_LEN + 7);
        assert_eq!(fit.params[0], 7.0);
        assert_close(packed::unpack(&fit.params).unwrap(), &truth, 1e-4);
    }

    #[test]
    fn bounds_keep_parameters_in_range() {
        let thickness = 100.0;
        let truth = [4.0, 4.0];
        let depth = depths(51, thickness);
        let values = measured(&depth, &truth, thickness, ModelKind::Histogram);

        let opts = SolverOptions {
            bounds: Some(vec![(0.0, 3.0), (0.0, 3.0)]),
            ..SolverOptions::default()
        };
        let fit = fit_parameters(&depth, &values, 2, thickness, ModelKind::Histogram, &opts).unwrap();
        assert!(fit.params.iter().all(|&p| (0.0..=3.0).contains(&p)));
        assert_close(&fit.params, &[3.0, 3.0], 1e-9);
    }

    #[test]
    fn mismatched_lengths_are_degenerate() {
        let err = fit_parameters(&[0.0, 1.0], &[0.0], 2, 1.0, ModelKind::Histogram, &SolverOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);

        let err =
            fit_parameters(&[], &[], 2, 1.0, ModelKind::Histogram, &SolverOptions::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DegenerateInput);
    }

    #[test]
    fn zero_size_spline_is_invalid() {
        let err = fit_parameters(&[0.0, 1.0], &[0.0, 0.0], 0, 1.0, ModelKind::SmoothSpline, &SolverOptions::default())
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidParameterVector);
    }
}

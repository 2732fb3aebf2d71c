//! Profile evaluation for every `ModelKind`.
//!
//! All evaluators share the same contract:
//! - input: depth samples, a parameter vector, the total thickness
//! - output: one profile value per depth, in fractional units (basis output / 100)
//!
//! `evaluate_profile` validates the inputs and dispatches; the per-kind functions
//! below assume their arity has already been checked.

use tracing::trace;

use crate::domain::ModelKind;
use crate::error::AppError;
use crate::math::{constant_spline, cubic_spline, pseudo_voigt};
use crate::models::packed;

/// Control points prepended by the smooth spline (zero value, slope, curvature).
const SMOOTH_PREFIX: [f64; 3] = [0.0; 3];

/// Basis functions work in percent.
const PERCENT: f64 = 100.0;

/// Evaluate a depth profile.
///
/// # Errors
/// - `DegenerateInput` for an empty grid or a non-positive/non-finite thickness
/// - `InvalidParameterVector` when `params` violates the model's arity rule
pub fn evaluate_profile(
    depth: &[f64],
    params: &[f64],
    thickness: f64,
    model: ModelKind,
) -> Result<Vec<f64>, AppError> {
    if depth.is_empty() {
        return Err(AppError::degenerate("Depth grid is empty."));
    }
    if !(thickness.is_finite() && thickness > 0.0) {
        return Err(AppError::degenerate(format!(
            "Thickness must be finite and > 0, got {thickness}."
        )));
    }

    let values = model_params(model, params)?;
    trace!(model = model.display_name(), n = depth.len(), p = values.len(), "evaluate profile");

    let profile = match model.base() {
        ModelKind::SmoothSpline => smooth_spline(depth, values, thickness),
        ModelKind::AbruptSpline => abrupt_spline(depth, values, thickness),
        ModelKind::Histogram => histogram(depth, values, thickness),
        _ => peak_shape(depth, values, thickness),
    };
    Ok(profile)
}

/// Unpack (for `*Inline` kinds) and arity-check a parameter vector.
pub fn model_params(model: ModelKind, params: &[f64]) -> Result<&[f64], AppError> {
    let values = if model.is_inline() {
        packed::unpack(params)?
    } else {
        params
    };
    check_arity(model, values.len())?;
    Ok(values)
}

/// Check an unpacked parameter count against the model's arity rule.
pub fn check_arity(model: ModelKind, len: usize) -> Result<(), AppError> {
    let ok = if model.is_peak() {
        len == ModelKind::PEAK_ARITY
    } else {
        len >= model.min_params()
    };
    if ok {
        return Ok(());
    }

    let expected = if model.is_peak() {
        format!("exactly {}", ModelKind::PEAK_ARITY)
    } else {
        format!("at least {}", model.min_params())
    };
    Err(AppError::invalid_parameters(format!(
        "Model '{}' needs {expected} parameters, got {len}.",
        model.display_name()
    )))
}

fn smooth_spline(depth: &[f64], free: &[f64], thickness: f64) -> Vec<f64> {
    let mut w = Vec::with_capacity(SMOOTH_PREFIX.len() + free.len());
    w.extend_from_slice(&SMOOTH_PREFIX);
    w.extend_from_slice(free);
    abrupt_spline(depth, &w, thickness)
}

fn abrupt_spline(depth: &[f64], w: &[f64], thickness: f64) -> Vec<f64> {
    let segments = (w.len() - 3) as f64;
    depth
        .iter()
        .map(|&d| cubic_spline(d * segments / thickness, w) / PERCENT)
        .collect()
}

fn histogram(depth: &[f64], w: &[f64], thickness: f64) -> Vec<f64> {
    let segments = w.len() as f64;
    depth
        .iter()
        .map(|&d| constant_spline(d * segments / thickness, w) / PERCENT)
        .collect()
}

/// Asymmetric pseudo-Voigt parameters, with location and widths in depth units.
#[derive(Debug, Clone, Copy)]
struct PeakParams {
    height: f64,
    loc: f64,
    fwhm_low: f64,
    fwhm_high: f64,
    eta_low: f64,
    eta_high: f64,
    background: f64,
}

impl PeakParams {
    fn from_slice(p: &[f64], thickness: f64) -> Self {
        Self {
            height: p[0],
            loc: p[1] * thickness,
            fwhm_low: p[2] * thickness,
            fwhm_high: p[3] * thickness,
            eta_low: p[4],
            eta_high: p[5],
            background: p[6],
        }
    }

    /// Branch for depths at or before the peak.
    fn low(&self, d: f64) -> f64 {
        pseudo_voigt(d, self.height, self.loc, self.fwhm_low, self.eta_low) / PERCENT
    }

    /// Branch for depths past the peak, decaying onto the background floor.
    fn high(&self, d: f64) -> f64 {
        let shape = pseudo_voigt(d, self.height - self.background, self.loc, self.fwhm_high, self.eta_high);
        (shape + self.background) / PERCENT
    }
}

fn peak_shape(depth: &[f64], p: &[f64], thickness: f64) -> Vec<f64> {
    let peak = PeakParams::from_slice(p, thickness);
    depth
        .iter()
        .map(|&d| if d <= peak.loc { peak.low(d) } else { peak.high(d) })
        .collect()
}

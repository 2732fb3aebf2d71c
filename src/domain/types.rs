//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - passed by value between the model, resampler and fitter
//! - exported to JSON alongside an evaluated profile
//! - reloaded later for comparison

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, ErrorKind};

/// Profile evaluation strategy.
///
/// The `*Inline` variants carry their control points packed behind a size tag
/// (see `models::packed`); they evaluate exactly like their base variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ModelKind {
    /// Cubic B-spline with three implicit zero control points at the start.
    SmoothSpline,
    /// Cubic B-spline over the full control-point vector.
    AbruptSpline,
    /// Asymmetric pseudo-Voigt with a background floor on the deep side.
    PeakShape,
    /// Piecewise-constant steps, one per control point.
    Histogram,
    PeakShapeInline,
    SmoothSplineInline,
    AbruptSplineInline,
}

impl ModelKind {
    pub const ALL: [ModelKind; 7] = [
        ModelKind::SmoothSpline,
        ModelKind::AbruptSpline,
        ModelKind::PeakShape,
        ModelKind::Histogram,
        ModelKind::PeakShapeInline,
        ModelKind::SmoothSplineInline,
        ModelKind::AbruptSplineInline,
    ];

    /// Number of parameters of the peak-shape variants.
    pub const PEAK_ARITY: usize = 7;

    /// Decode a legacy integer model code (`0..=6`).
    pub fn from_code(code: i64) -> Result<Self, AppError> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or_else(|| {
                AppError::new(
                    ErrorKind::UnsupportedVariant,
                    format!("Unsupported model code {code} (expected 0..=6)."),
                )
            })
    }

    /// Legacy integer model code.
    pub fn code(self) -> u8 {
        match self {
            ModelKind::SmoothSpline => 0,
            ModelKind::AbruptSpline => 1,
            ModelKind::PeakShape => 2,
            ModelKind::Histogram => 3,
            ModelKind::PeakShapeInline => 4,
            ModelKind::SmoothSplineInline => 5,
            ModelKind::AbruptSplineInline => 6,
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::SmoothSpline => "cubic spline (smooth)",
            ModelKind::AbruptSpline => "cubic spline (abrupt)",
            ModelKind::PeakShape => "asymmetric pseudo-Voigt",
            ModelKind::Histogram => "histogram",
            ModelKind::PeakShapeInline => "asymmetric pseudo-Voigt (packed)",
            ModelKind::SmoothSplineInline => "cubic spline (smooth, packed)",
            ModelKind::AbruptSplineInline => "cubic spline (abrupt, packed)",
        }
    }

    pub fn is_inline(self) -> bool {
        matches!(
            self,
            ModelKind::PeakShapeInline | ModelKind::SmoothSplineInline | ModelKind::AbruptSplineInline
        )
    }

    /// The variant that actually evaluates the (unpacked) parameters.
    pub fn base(self) -> ModelKind {
        match self {
            ModelKind::PeakShapeInline => ModelKind::PeakShape,
            ModelKind::SmoothSplineInline => ModelKind::SmoothSpline,
            ModelKind::AbruptSplineInline => ModelKind::AbruptSpline,
            other => other,
        }
    }

    pub fn is_peak(self) -> bool {
        self.base() == ModelKind::PeakShape
    }

    /// Smallest accepted number of unpacked parameters.
    pub fn min_params(self) -> usize {
        match self.base() {
            ModelKind::SmoothSpline | ModelKind::Histogram => 1,
            ModelKind::AbruptSpline => 4,
            _ => Self::PEAK_ARITY,
        }
    }
}

/// Which physical quantity a profile describes.
///
/// The evaluation math is shared; the label only travels with exports and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileQuantity {
    Strain,
    DebyeWaller,
}

impl ProfileQuantity {
    pub fn display_name(self) -> &'static str {
        match self {
            ProfileQuantity::Strain => "strain",
            ProfileQuantity::DebyeWaller => "Debye-Waller factor",
        }
    }
}

/// Levenberg–Marquardt settings.
///
/// Defaults mirror the classic MINPACK `lmdif` tolerances.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Maximum outer iterations (one Jacobian per iteration).
    pub max_iterations: usize,
    /// Relative sum-of-squares reduction below which the fit is converged.
    pub ftol: f64,
    /// Relative step size below which the fit is converged.
    pub xtol: f64,
    /// Initial damping factor λ.
    pub lambda_init: f64,
    /// λ multiplier on a rejected step.
    pub lambda_up: f64,
    /// λ multiplier on an accepted step.
    pub lambda_down: f64,
    /// Relative forward-difference step for the Jacobian.
    pub fd_step: f64,
    /// Optional per-parameter `(lower, upper)` box. `None` leaves the fit unbounded.
    pub bounds: Option<Vec<(f64, f64)>>,
    /// Optional wall-clock budget; the best point so far is returned when exceeded.
    pub time_budget: Option<Duration>,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            max_iterations: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            lambda_init: 1e-3,
            lambda_up: 10.0,
            lambda_down: 0.1,
            fd_step: 1.49012e-8,
            bounds: None,
            time_budget: None,
        }
    }
}

impl SolverOptions {
    pub fn validate(&self) -> Result<(), AppError> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if self.max_iterations == 0 {
            return Err(AppError::new(ErrorKind::Usage, "max_iterations must be >= 1."));
        }
        if !(positive(self.ftol) && positive(self.xtol) && positive(self.fd_step)) {
            return Err(AppError::new(ErrorKind::Usage, "Solver tolerances must be finite and > 0."));
        }
        if !(positive(self.lambda_init) && self.lambda_up > 1.0 && positive(self.lambda_down) && self.lambda_down < 1.0) {
            return Err(AppError::new(
                ErrorKind::Usage,
                "Invalid damping schedule (need lambda_init > 0, lambda_up > 1, 0 < lambda_down < 1).",
            ));
        }
        if let Some(bounds) = &self.bounds {
            for (i, &(lo, hi)) in bounds.iter().enumerate() {
                if lo.is_nan() || hi.is_nan() || lo > hi {
                    return Err(AppError::new(
                        ErrorKind::Usage,
                        format!("Invalid bound for parameter {i}: [{lo}, {hi}]."),
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Why the solver stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Termination {
    /// Residuals are exactly zero.
    ExactFit,
    /// Actual and predicted relative reductions fell below `ftol`.
    SumOfSquares,
    /// Step fell below `xtol` relative to the parameter norm.
    StepSize,
    /// `max_iterations` reached.
    MaxIterations,
    /// `time_budget` exhausted.
    TimeBudget,
    /// Damping grew without finding a downhill step.
    Stalled,
}

impl Termination {
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            Termination::ExactFit | Termination::SumOfSquares | Termination::StepSize
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Termination::ExactFit => "exact fit",
            Termination::SumOfSquares => "sum-of-squares tolerance",
            Termination::StepSize => "step-size tolerance",
            Termination::MaxIterations => "iteration limit",
            Termination::TimeBudget => "time budget",
            Termination::Stalled => "stalled",
        }
    }
}

/// Solver outcome attached to every resample/fit result.
///
/// Non-convergence is a warning, not a failure: the parameters are still the
/// best point the solver found.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolverStatus {
    pub converged: bool,
    pub termination: Termination,
    pub iterations: usize,
    pub evaluations: usize,
}

/// Result of a resample or fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFit {
    pub model: ModelKind,
    /// Parameters in the caller's convention (packed for `*Inline` models).
    pub params: Vec<f64>,
    /// Thickness the parameters refer to (`max(depth)` for peak-shape fits).
    pub thickness: f64,
    pub sse: f64,
    pub rmse: f64,
    pub status: SolverStatus,
}

/// A saved profile file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileFile {
    pub tool: String,
    pub generated: String,
    pub quantity: ProfileQuantity,
    pub model: ModelKind,
    pub model_code: u8,
    pub params: Vec<f64>,
    pub thickness: f64,
    pub grid: ProfileGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileGrid {
    pub depth: Vec<f64>,
    pub value: Vec<f64>,
}

//! Change the number of parameters of a profile while keeping its shape.
//!
//! When the user picks a different control-point count, the new parameters are
//! the least-squares best match of the new basis to the old profile on the same
//! depth grid. An `m`-point basis generally cannot reproduce an `n`-point curve
//! exactly, so the result is a best fit, not an identity.

use crate::domain::{ModelKind, ProfileFit, SolverOptions};
use crate::error::AppError;
use crate::fit::fitter::{log_outcome, to_profile_fit};
use crate::fit::guess::uniform_guess;
use crate::math::minimize;
use crate::models::{check_arity, evaluate_profile};

/// Re-express `old_params` with `new_size` parameters.
///
/// The solve always starts from `new_size` ones. For `*Inline` models the old
/// buffer is unpacked, the solve runs on the base model, and the result is
/// packed again with the new size.
pub fn resample_parameters(
    depth: &[f64],
    old_params: &[f64],
    thickness: f64,
    new_size: usize,
    model: ModelKind,
    opts: &SolverOptions,
) -> Result<ProfileFit, AppError> {
    let reference = evaluate_profile(depth, old_params, thickness, model)?;

    let base = model.base();
    check_arity(base, new_size)?;
    let guess = uniform_guess(new_size);

    let residuals = |p: &[f64]| -> Result<Vec<f64>, AppError> {
        let profile = evaluate_profile(depth, p, thickness, base)?;
        Ok(profile.iter().zip(reference.iter()).map(|(a, b)| a - b).collect())
    };

    let outcome = minimize(residuals, &guess, opts)?;
    let fit = to_profile_fit(model, outcome, thickness);
    log_outcome("resample", &fit);
    Ok(fit)
}

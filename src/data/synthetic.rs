//! Synthetic measured profiles for demos and closed-loop checks.
//!
//! A known parameter vector is evaluated on an evenly spaced depth grid and
//! Gaussian noise is added to every value. Measured data is referenced from the
//! bottom of the layer, so the model is evaluated at `thickness - depth`.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::ModelKind;
use crate::error::{AppError, ErrorKind};
use crate::models::{depth_grid, evaluate_profile};

#[derive(Debug, Clone)]
pub struct SyntheticConfig {
    pub model: ModelKind,
    pub params: Vec<f64>,
    pub thickness: f64,
    pub samples: usize,
    /// Standard deviation of the additive noise, in profile units (fraction).
    pub noise: f64,
    pub seed: u64,
}

#[derive(Debug, Clone)]
pub struct SyntheticProfile {
    pub depth: Vec<f64>,
    /// Noise-free model values.
    pub clean: Vec<f64>,
    /// `clean` plus noise.
    pub values: Vec<f64>,
}

pub fn generate_profile(config: &SyntheticConfig) -> Result<SyntheticProfile, AppError> {
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::new(
            ErrorKind::Usage,
            format!("Noise level must be finite and >= 0, got {}.", config.noise),
        ));
    }

    let depth = depth_grid(config.thickness, config.samples)?;
    let height: Vec<f64> = depth.iter().map(|&d| config.thickness - d).collect();
    let clean = evaluate_profile(&height, &config.params, config.thickness, config.model)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::new(ErrorKind::Usage, format!("Noise distribution error: {e}")))?;

    let values = clean.iter().map(|&v| v + normal.sample(&mut rng)).collect();

    Ok(SyntheticProfile { depth, clean, values })
}

//! `depth-profiles` library crate.
//!
//! Strain and Debye-Waller depth profiles of ion-damaged crystals, described by
//! a handful of model families (cubic B-splines, histograms, an asymmetric
//! pseudo-Voigt peak), plus the two least-squares services built on them:
//! resampling a parameter vector to a new size, and fitting measured data.
//!
//! The binary (`dprof`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the evaluator can be embedded in a larger simulation loop

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod logging;
pub mod math;
pub mod models;
pub mod report;

pub use domain::{ModelKind, ProfileFit, SolverOptions};
pub use error::AppError;
pub use fit::{fit_parameters, resample_parameters};
pub use models::evaluate_profile;

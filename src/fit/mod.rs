//! Parameter recovery.
//!
//! Responsibilities:
//!
//! - choose an initial guess and reference thickness per model
//! - resample a profile onto a different parameter count
//! - fit a model to measured depth/value pairs

pub mod fitter;
pub mod guess;
pub mod resample;

pub use fitter::*;
pub use guess::*;
pub use resample::*;

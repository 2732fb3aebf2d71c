//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - the model selector (`ModelKind`) and profile labels (`ProfileQuantity`)
//! - solver configuration and status (`SolverOptions`, `SolverStatus`)
//! - fit outputs and the exported profile file (`ProfileFit`, `ProfileFile`)

pub mod types;

pub use types::*;

//! Depth-profile models.
//!
//! Models are implemented as small, pure functions so that resampling and fitting
//! code can stay generic over `ModelKind`.

pub mod grid;
pub mod model;
pub mod packed;

pub use grid::*;
pub use model::*;

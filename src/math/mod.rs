//! Numeric primitives: spline bases, the pseudo-Voigt line shape and least squares.

pub mod basis;
pub mod lm;
pub mod ols;
pub mod peak;

pub use basis::*;
pub use lm::*;
pub use ols::*;
pub use peak::*;

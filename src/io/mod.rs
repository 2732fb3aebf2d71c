//! Input/output helpers.
//!
//! - depth/value table exports (`export`)
//! - measured two-column profile reader (`measured`)
//! - profile JSON read/write (`profile`)

pub mod export;
pub mod measured;
pub mod profile;

pub use export::*;
pub use measured::*;
pub use profile::*;

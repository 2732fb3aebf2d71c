//! Data sources that do not come from the command line.

pub mod synthetic;

pub use synthetic::*;

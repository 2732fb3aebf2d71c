//! Reporting: formatted terminal output for profiles and fits.

pub mod format;

pub use format::*;

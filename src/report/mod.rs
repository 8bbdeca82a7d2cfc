//! Reporting utilities: formatted terminal output for every analysis.

pub mod format;

pub use format::*;

//! `scada-series` library crate.
//!
//! Loads SCADA wind-farm generation exports, aggregates the selected columns
//! into one time series, and analyses it (resampling, value distributions,
//! deviations, windows around a stamp, epoch detection).
//!
//! The binary (`scada`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the series operations are reusable from other tools

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod plot;
pub mod report;
pub mod series;

pub use error::{Result, ScadaError};
pub use series::ScadaSeries;

//! Domain types used throughout the crate.
//!
//! This module defines:
//!
//! - resampling knobs (`Aggregator`, `ResamplePeriod`)
//! - analysis outputs (`DistributionPoint`, `DropEvent`, `RelativePoint`)
//! - run configuration for the CLI (`RunConfig`, `SourceSelection`)

pub mod types;

pub use types::*;

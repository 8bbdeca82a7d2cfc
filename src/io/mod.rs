//! Input/output helpers.
//!
//! - SCADA CSV ingest + fuzzy column selection (`ingest`)
//! - named site groups (`groups`)
//! - result exports (CSV/JSON) (`export`)

pub mod export;
pub mod groups;
pub mod ingest;

pub use export::*;
pub use groups::*;
pub use ingest::*;

//! Data sources other than real SCADA exports.

pub mod synth;

pub use synth::{SynthConfig, SynthExport, SynthFarm, default_farms, generate, write_synthetic_csv};

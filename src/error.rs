//! Error types.
//!
//! - `ScadaError` is the library taxonomy returned by loading and analysis.
//! - `AppError` is what the `scada` binary reports: a message plus a process
//!   exit code.

use chrono::NaiveDateTime;
use thiserror::Error;

/// Result alias for library operations.
pub type Result<T> = std::result::Result<T, ScadaError>;

/// Errors raised while loading or analysing a SCADA series.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScadaError {
    /// The source file could not be opened or read.
    #[error("failed to read '{path}': {message}")]
    FileRead { path: String, message: String },

    /// The `Timestamp` column is missing, a timestamp does not parse, or a
    /// record is malformed.
    #[error("schema error: {0}")]
    Schema(String),

    /// A statistic was requested over a series with no usable samples.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A selector or group resolved to no columns.
    #[error("no match: {0}")]
    NoMatch(String),

    /// A reference timestamp is not part of the series index.
    #[error("timestamp {0} is not in the series index")]
    StampNotFound(NaiveDateTime),

    /// A caller-supplied parameter is out of range or unparseable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Writing an export failed.
    #[error("export failed: {0}")]
    Export(String),
}

impl ScadaError {
    /// Exit code the CLI uses for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ScadaError::FileRead { .. }
            | ScadaError::Schema(_)
            | ScadaError::NoMatch(_)
            | ScadaError::StampNotFound(_)
            | ScadaError::InvalidParameter(_) => 2,
            ScadaError::EmptyInput(_) => 3,
            ScadaError::Export(_) => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl From<ScadaError> for AppError {
    fn from(err: ScadaError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

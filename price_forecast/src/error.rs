//! Error types for the price_forecast crate

use polars::prelude::PolarsError;
use thiserror::Error;

/// Custom error types for the price_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Invalid layer config, non-positive epochs/lookback/horizon/forecast period,
    /// or a forecast period larger than the derivable windows
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Frame too short to build the requested windows
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Zero-variance feature column or non-finite loss during training
    #[error("Numeric degeneracy: {0}")]
    NumericDegeneracy(String),

    /// Failure surfaced by model fitting or prediction
    #[error("Computation error: {0}")]
    ComputationError(String),

    /// Error related to data validation or processing
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Error from Polars operations
    #[error("Polars error: {0}")]
    PolarsError(String),

    /// Error reading or writing JSON/CSV
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Coarse classification of a [`ForecastError`], for callers that present
/// errors without matching on every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    InsufficientData,
    NumericDegeneracy,
    Computation,
    Data,
    Io,
}

impl ForecastError {
    /// Kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ForecastError::ConfigurationError(_) => ErrorKind::Configuration,
            ForecastError::InsufficientData(_) => ErrorKind::InsufficientData,
            ForecastError::NumericDegeneracy(_) => ErrorKind::NumericDegeneracy,
            ForecastError::ComputationError(_) => ErrorKind::Computation,
            ForecastError::DataError(_)
            | ForecastError::PolarsError(_)
            | ForecastError::SerializationError(_) => ErrorKind::Data,
            ForecastError::IoError(_) => ErrorKind::Io,
        }
    }
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<PolarsError> for ForecastError {
    fn from(err: PolarsError) -> Self {
        ForecastError::PolarsError(err.to_string())
    }
}

impl From<serde_json::Error> for ForecastError {
    fn from(err: serde_json::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::SerializationError(err.to_string())
    }
}

impl From<trade_math::MathError> for ForecastError {
    fn from(err: trade_math::MathError) -> Self {
        ForecastError::ConfigurationError(err.to_string())
    }
}

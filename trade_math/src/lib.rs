//! # Trade Math
//!
//! Technical indicator calculations used as optional extra features for the
//! price forecasting pipeline.
//!
//! Every indicator is available both as a streaming calculator
//! (`update` / `value`) and as a series helper that returns a column aligned
//! with its input, padded with `NaN` while the indicator warms up.
//!
//! ```
//! use trade_math::moving_averages::sma;
//!
//! let averages = sma(&[1.0, 2.0, 3.0, 4.0], 2).unwrap();
//! assert!(averages[0].is_nan());
//! assert_eq!(averages[3], 3.5);
//! ```

use thiserror::Error;

// Indicator modules
pub mod moving_averages;
pub mod oscillators;

pub use moving_averages::{ema, sma, ExponentialMovingAverage, SimpleMovingAverage};
pub use oscillators::{rsi, RelativeStrengthIndex};

/// Errors that can occur in indicator calculations
#[derive(Error, Debug)]
pub enum MathError {
    #[error("Insufficient data for calculation: {0}")]
    InsufficientData(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type for trading math operations
pub type Result<T> = std::result::Result<T, MathError>;
